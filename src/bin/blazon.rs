use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "blazon", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Render a frame sequence as numbered PNGs.
    Sequence(SequenceArgs),
    /// Encode a parameter file as a shareable code.
    Encode(EncodeArgs),
    /// Decode a share code back into parameter JSON.
    Decode(DecodeArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input parameter JSON; defaults apply when omitted.
    #[arg(long = "in")]
    in_path: Option<PathBuf>,

    /// Timestamp to render at, milliseconds.
    #[arg(long, default_value_t = 0.0)]
    time_ms: f64,

    /// Color scheme to apply on top of the loaded parameters.
    #[arg(long)]
    scheme: Option<String>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[arg(long, default_value_t = 1024)]
    width: u32,

    #[arg(long, default_value_t = 1024)]
    height: u32,
}

#[derive(Parser, Debug)]
struct SequenceArgs {
    /// Input parameter JSON; defaults apply when omitted.
    #[arg(long = "in")]
    in_path: Option<PathBuf>,

    /// Output directory for frame_0000.png ...
    #[arg(long)]
    out_dir: PathBuf,

    /// Color scheme to apply on top of the loaded parameters.
    #[arg(long)]
    scheme: Option<String>,

    /// Number of frames to render.
    #[arg(long, default_value_t = 60)]
    frames: u32,

    /// Playback rate used to derive frame timestamps.
    #[arg(long, default_value_t = 60.0)]
    fps: f64,

    #[arg(long, default_value_t = 1024)]
    width: u32,

    #[arg(long, default_value_t = 1024)]
    height: u32,
}

#[derive(Parser, Debug)]
struct EncodeArgs {
    /// Input parameter JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct DecodeArgs {
    /// Share code produced by `blazon encode`.
    code: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Sequence(args) => cmd_sequence(args),
        Command::Encode(args) => cmd_encode(args),
        Command::Decode(args) => cmd_decode(args),
    }
}

fn read_params(path: Option<&Path>) -> anyhow::Result<blazon::PatternParameters> {
    let Some(path) = path else {
        return Ok(blazon::PatternParameters::default());
    };
    let f = File::open(path).with_context(|| format!("open parameters '{}'", path.display()))?;
    let r = BufReader::new(f);
    let params: blazon::PatternParameters =
        serde_json::from_reader(r).with_context(|| "parse parameter JSON")?;
    Ok(params)
}

fn apply_scheme(params: &mut blazon::PatternParameters, scheme: Option<String>) {
    if let Some(id) = scheme {
        params.color_scheme = id;
        params.apply_scheme(&blazon::SchemeRegistry::new());
    }
}

fn write_png(frame: &blazon::Frame, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        path,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let mut params = read_params(args.in_path.as_deref())?;
    apply_scheme(&mut params, args.scheme);
    let mut player = blazon::Player::new(&params, args.width, args.height)?;
    let frames = player.capture(&[0.0, args.time_ms])?;
    let frame = frames
        .into_iter()
        .next_back()
        .ok_or_else(|| anyhow::anyhow!("capture produced no frames"))?;

    write_png(&frame, &args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_sequence(args: SequenceArgs) -> anyhow::Result<()> {
    if args.frames == 0 {
        anyhow::bail!("sequence needs at least one frame");
    }
    if !(args.fps.is_finite() && args.fps > 0.0) {
        anyhow::bail!("fps must be finite and > 0");
    }

    let mut params = read_params(args.in_path.as_deref())?;
    apply_scheme(&mut params, args.scheme);
    let mut player = blazon::Player::new(&params, args.width, args.height)?;

    let step_ms = 1000.0 / args.fps;
    let timestamps: Vec<f64> = (0..args.frames).map(|i| f64::from(i) * step_ms).collect();
    let frames = player.capture(&timestamps)?;

    for (i, frame) in frames.iter().enumerate() {
        let path = args.out_dir.join(format!("frame_{i:04}.png"));
        write_png(frame, &path)?;
    }
    eprintln!(
        "wrote {} frames to {}",
        frames.len(),
        args.out_dir.display()
    );
    Ok(())
}

fn cmd_encode(args: EncodeArgs) -> anyhow::Result<()> {
    let params = read_params(Some(&args.in_path))?;
    println!("{}", blazon::share::encode(&params)?);
    Ok(())
}

fn cmd_decode(args: DecodeArgs) -> anyhow::Result<()> {
    let params = blazon::share::decode(&args.code)?;
    println!("{}", serde_json::to_string_pretty(&params)?);
    Ok(())
}
