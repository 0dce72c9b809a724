use anyhow::{Context, Result, bail};
use arboard::Clipboard;
use clap::Parser;
use region_stitch_core::{
    Config, GeminiRecognizer, GroupId, Settings, SourceImage, StitchOutcome, StitchSession,
    Viewport,
    image_processing::ImageProcessor,
    init,
    persistence::{JsonRecordWriter, RecordSink},
    recognition::TextRecognizer,
    selection::{GestureOutcome, PointerButton},
    session::{InputOutcome, PointerEvent},
};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Image to select regions from
    image: PathBuf,

    /// Viewport size the selections are expressed in (defaults to the image size)
    #[arg(long, value_name = "WxH")]
    viewport: Option<ViewportArg>,

    /// Selection drag in viewport pixels, e.g. 0:100,100,300,220 (repeatable)
    #[arg(short, long = "select", value_name = "G:X0,Y0,X1,Y1")]
    selections: Vec<SelectArg>,

    /// Horizontal drag, in pixels, applied with the rotate modifier held before selecting
    #[arg(long, value_name = "PX", allow_hyphen_values = true)]
    rotate: Option<f64>,

    /// Write the stitched snapshot to this file
    #[arg(long, value_name = "PATH")]
    snapshot: Option<PathBuf>,

    /// Append the finished record as a JSON line to this file
    #[arg(long, value_name = "PATH")]
    record: Option<PathBuf>,

    /// Send the snapshot to Gemini and split the text across groups
    #[arg(long, default_value_t = false)]
    ocr: bool,

    /// Override the model defined in .env
    #[arg(short, long)]
    model: Option<String>,

    /// Copy the recognized text to clipboard automatically
    #[arg(short, long, default_value_t = false)]
    copy: bool,
}

#[derive(Clone, Copy, Debug)]
struct ViewportArg(Viewport);

impl FromStr for ViewportArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WxH, got '{s}'"))?;
        let width: f64 = w.trim().parse().map_err(|_| format!("invalid width '{w}'"))?;
        let height: f64 = h.trim().parse().map_err(|_| format!("invalid height '{h}'"))?;
        if !(width > 0.0 && height > 0.0) {
            return Err("viewport dimensions must be positive".to_string());
        }
        Ok(Self(Viewport::new(width, height)))
    }
}

#[derive(Clone, Copy, Debug)]
struct SelectArg {
    group: GroupId,
    from: (f64, f64),
    to: (f64, f64),
}

impl FromStr for SelectArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (group, coords) = s
            .split_once(':')
            .ok_or_else(|| format!("expected G:X0,Y0,X1,Y1, got '{s}'"))?;
        let group = group
            .trim()
            .parse::<u8>()
            .ok()
            .and_then(GroupId::new)
            .ok_or_else(|| format!("group must be 0..{}", GroupId::COUNT - 1))?;
        let values = coords
            .split(',')
            .map(|v| v.trim().parse::<f64>().map_err(|_| format!("invalid coordinate '{v}'")))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let &[x0, y0, x1, y1] = values.as_slice() else {
            return Err(format!("expected four coordinates, got {}", values.len()));
        };
        Ok(Self {
            group,
            from: (x0, y0),
            to: (x1, y1),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup
    init();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    // Load config and override model if specified via CLI
    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(m) = args.model.clone() {
        config.model_name = m;
    }
    let settings = Settings::load();

    let original = image::open(&args.image)
        .with_context(|| format!("Failed to open image {}", args.image.display()))?;
    let source = SourceImage::from_image(&original).context("Unsupported image")?;
    let viewport = args.viewport.map(|v| v.0).unwrap_or_else(|| {
        Viewport::new(f64::from(original.width()), f64::from(original.height()))
    });
    let mut session =
        StitchSession::new(source, viewport, config).context("Failed to start session")?;

    if let Some(px) = args.rotate {
        rotate(&mut session, px);
    }
    for select in &args.selections {
        replay(&mut session, select);
    }

    match session.stitch().context("Failed to stitch selections")? {
        StitchOutcome::Stitched(summary) => {
            for group in &summary.dropped {
                eprintln!("Warning: group {group} does not overlap the image");
            }
            println!(
                "Stitched {} group(s), composite height {:.4}",
                summary.stacked.len(),
                summary.total_height
            );
        }
        StitchOutcome::NothingSelected => {
            bail!("No selections to stitch; pass at least one --select")
        }
        StitchOutcome::AlreadyJoined => {}
    }

    for pixels in session.pixel_regions()? {
        let tag = settings.tag(pixels.group);
        match pixels.rect {
            Some(r) => println!(
                "[{}] {tag}: ({:.1}, {:.1}) - ({:.1}, {:.1})",
                pixels.group, r.min_x, r.min_y, r.max_x, r.max_y
            ),
            None => println!("[{}] {tag}: <empty>", pixels.group),
        }
    }

    if args.snapshot.is_some() || args.ocr {
        let rendered = session
            .render_snapshot(&original)
            .context("Failed to render snapshot")?;

        if let Some(path) = &args.snapshot {
            rendered
                .image
                .save(path)
                .with_context(|| format!("Failed to save snapshot to {}", path.display()))?;
            println!("Snapshot written to {}", path.display());
        }

        if args.ocr {
            let snapshot = ImageProcessor::encode_png(&rendered.image)
                .context("Failed to encode snapshot")?;
            let recognizer = GeminiRecognizer::new(session.config())?;
            let prompt = session.recognition_prompt(&settings);

            eprintln!("Recognizing with {}...", session.config().model_name);
            let text = recognizer
                .recognize(&snapshot, &prompt)
                .await
                .context("Gemini API Error")?;
            session.distribute_text(&text)?;

            for group in session.store().groups().filter(|g| g.cropped().is_some()) {
                println!("\n## {}\n{}", settings.tag(group.id()), group.text().get());
            }

            if args.copy {
                copy_to_clipboard(text);
            }
        }
    }

    if let Some(path) = &args.record {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open record file {}", path.display()))?;
        JsonRecordWriter::new(file)
            .submit(&session.finish(&settings))
            .context("Failed to write record")?;
    }

    Ok(())
}

/// Replays a horizontal drag with the rotate modifier held.
fn rotate(session: &mut StitchSession, px: f64) {
    let center = (session.scene().viewport.width / 2.0, session.scene().viewport.height / 2.0);
    session.set_rotate_modifier(true);
    if let InputOutcome::Rotated(angle) = session.handle_pointer(PointerEvent::Move {
        x: center.0 + px,
        y: center.1,
        dx: px,
    }) {
        log::info!("rotated image by {angle:.4} rad");
    }
    session.set_rotate_modifier(false);
}

/// Replays one selection as a press, drag and release in the given group.
fn replay(session: &mut StitchSession, select: &SelectArg) {
    session.set_active_group(select.group);
    let down = session.handle_pointer(PointerEvent::Down {
        x: select.from.0,
        y: select.from.1,
        button: PointerButton::Primary,
        over_ui: false,
    });
    if down != InputOutcome::Gesture(GestureOutcome::Started) {
        eprintln!("Warning: selection {select:?} was not started: {down:?}");
        return;
    }
    session.handle_pointer(PointerEvent::Move {
        x: select.to.0,
        y: select.to.1,
        dx: select.to.0 - select.from.0,
    });
    match session.handle_pointer(PointerEvent::Up) {
        InputOutcome::Gesture(GestureOutcome::Committed(id)) => {
            log::debug!("selection {id:?} committed to group {}", select.group);
        }
        other => eprintln!("Warning: selection {select:?} was dropped: {other:?}"),
    }
}

fn copy_to_clipboard(text: String) {
    match Clipboard::new() {
        Ok(mut clipboard) => {
            if let Err(e) = clipboard.set_text(text) {
                eprintln!("Warning: Failed to copy to clipboard: {}", e);
            } else {
                println!("(Copied to clipboard)");
            }
        }
        Err(e) => eprintln!("Warning: Could not access clipboard: {}", e),
    }
}
