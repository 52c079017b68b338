pub mod classifier;
pub mod clusterer;
pub mod data_point;
pub mod palette;
