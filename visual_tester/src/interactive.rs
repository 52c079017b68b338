use std::sync::{Arc, Mutex};

use density_vision::pipeline::{Command, DensityPipeline, InputEvent, PipelineConfig, Report};
use density_vision::render::render_frame;
use image::RgbaImage;
use opencv::{
    core::{self, Mat, Scalar},
    highgui, imgproc,
    prelude::*,
};
use tracing::info;

const WINDOW_NAME: &str = "density_vision";
const ESCAPE: i32 = 27;

/// Runs the drawing window until Esc, `q` or the window closes.
pub fn run(config: PipelineConfig) -> anyhow::Result<()> {
    let mut pipeline = DensityPipeline::new(config);

    highgui::named_window(WINDOW_NAME, highgui::WINDOW_AUTOSIZE)?;

    // The mouse callback fires from inside `wait_key`; queue its events and
    // drain them on the main loop.
    let queue: Arc<Mutex<Vec<InputEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&queue);
    highgui::set_mouse_callback(
        WINDOW_NAME,
        Some(Box::new(move |event, x, y, _flags| {
            let (x, y) = (f64::from(x), f64::from(y));
            let input = match event {
                highgui::EVENT_LBUTTONDOWN => Some(InputEvent::Press { x, y }),
                highgui::EVENT_LBUTTONUP => Some(InputEvent::Release),
                highgui::EVENT_MOUSEMOVE => Some(InputEvent::Motion { x, y }),
                _ => None,
            };
            if let (Some(input), Ok(mut pending)) = (input, sink.lock()) {
                pending.push(input);
            }
        })),
    )?;

    loop {
        let pending: Vec<InputEvent> = match queue.lock() {
            Ok(mut pending) => pending.drain(..).collect(),
            Err(_) => Vec::new(),
        };
        for event in pending {
            pipeline.process_event(event);
        }

        highgui::imshow(WINDOW_NAME, &to_bgr_mat(&render_frame(&pipeline))?)?;

        let key = highgui::wait_key(15)?;
        if key < 0 {
            if highgui::get_window_property(WINDOW_NAME, highgui::WND_PROP_VISIBLE)? < 1.0 {
                break;
            }
            continue;
        }
        let key = key & 0xFF;
        if key == ESCAPE || key == i32::from(b'q') {
            break;
        }
        if let Some(command) = char::from_u32(key as u32).and_then(Command::from_key) {
            match pipeline.process_event(InputEvent::Key { command }) {
                Report::Classified(counts) => info!(?counts, "classified"),
                Report::Clustered { clusters, isolated } => info!(clusters, isolated, "clustered"),
                _ => {}
            }
        }
    }

    highgui::destroy_all_windows()?;
    Ok(())
}

/// Copies an RGBA frame into a BGR OpenCV matrix for display.
fn to_bgr_mat(frame: &RgbaImage) -> opencv::Result<Mat> {
    let mut rgba = Mat::new_rows_cols_with_default(
        frame.height() as i32,
        frame.width() as i32,
        core::CV_8UC4,
        Scalar::all(0.0),
    )?;
    rgba.data_bytes_mut()?.copy_from_slice(frame.as_raw());

    let mut bgr = Mat::default();
    imgproc::cvt_color(&rgba, &mut bgr, imgproc::COLOR_RGBA2BGR, 0)?;
    Ok(bgr)
}
