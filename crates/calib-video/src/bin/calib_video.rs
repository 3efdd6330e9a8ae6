use calib_video::cli::{CalibrateArgs, Cli, Command, RectifyArgs};
use calib_video::cv;
use calib_video::rectifier::run_rectifier;
use calib_video::solver;
use clap::Parser;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    #[cfg(feature = "tracing")]
    calib_video::core::init_tracing(false, cli.log_level());
    #[cfg(not(feature = "tracing"))]
    calib_video::core::init_with_level(cli.log_level())?;

    match cli.command {
        Command::Calibrate(args) => calibrate(&args),
        Command::Rectify(args) => rectify(&args),
    }
}

fn calibrate(args: &CalibrateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let pattern = args.board_pattern()?;
    let cell_size = args.cell_size()?;

    println!("Extracting chessboard frames...");
    let params = args.sampler_params();
    let Some(result) = cv::calibrate_video(args.video_path(), pattern, cell_size, &params)? else {
        println!("No valid chessboard frames found.");
        return Ok(());
    };

    solver::print_summary(&result)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }
    Ok(())
}

fn rectify(args: &RectifyArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.config()?;
    // Fails before any window is opened if the video is missing.
    let mut source = cv::VideoFileSource::open(&config.video)?;

    println!(
        "Press '{}' to toggle between original and rectified view.",
        args.toggle_key
    );
    println!("Press ESC to exit.");

    let mut viewer = cv::HighGuiViewer::new(config.keys);
    let stats = run_rectifier(&mut source, &mut cv::OpenCvUndistorter, &mut viewer, &config)?;
    log::debug!("{stats:?}");
    Ok(())
}
