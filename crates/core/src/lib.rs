//! Region Stitch Core Library
//!
//! This library lets an operator mark rectangular regions over an image,
//! collect them into up to three selection groups, merge every group into
//! one cropped region, stack the regions into a single composite and map
//! the result back onto the source image's pixel grid for text recognition.
//!
//! # Overview
//!
//! - **Projection**: pointer positions to world points via [`projector`]
//! - **Drawing**: drag gestures to selections via [`selection`]
//! - **Rotation**: image and pending selections turned together via [`rotation`]
//! - **Boolean algebra**: union and crop of solids via [`algebra`]
//! - **Stitching**: union, crop, stack and re-frame via [`compositor`]
//! - **Pixel mapping**: composite geometry back to source pixels via [`mapper`]
//! - **Recognition**: snapshot rendering and text splitting via
//!   [`image_processing`], [`recognition`] and [`gemini`]
//!
//! # Quick Start
//!
//! ```ignore
//! use region_stitch_core::{Config, SourceImage, StitchSession, Viewport};
//! use region_stitch_core::session::PointerEvent;
//! use region_stitch_core::selection::PointerButton;
//!
//! let source = SourceImage::new(2000, 1600)?;
//! let viewport = Viewport::new(1000.0, 800.0);
//! let mut session = StitchSession::new(source, viewport, Config::load()?)?;
//!
//! session.handle_pointer(PointerEvent::Down {
//!     x: 100.0,
//!     y: 100.0,
//!     button: PointerButton::Primary,
//!     over_ui: false,
//! });
//! session.handle_pointer(PointerEvent::Move { x: 300.0, y: 220.0, dx: 200.0 });
//! session.handle_pointer(PointerEvent::Up);
//!
//! session.stitch()?;
//! for group in session.pixel_regions()? {
//!     println!("{}: {:?}", group.group, group.rect);
//! }
//! ```

pub mod algebra;
pub mod camera;
pub mod compositor;
pub mod config;
pub mod error;
pub mod gemini;
pub mod geometry;
pub mod image_processing;
pub mod mapper;
pub mod persistence;
pub mod projector;
pub mod recognition;
pub mod rotation;
pub mod scene;
pub mod selection;
pub mod session;
pub mod settings;
pub mod store;

// Re-export primary types for convenience
pub use camera::{Camera, Viewport};
pub use compositor::StitchOutcome;
pub use config::Config;
pub use error::{Result, StitchError};
pub use gemini::GeminiRecognizer;
pub use scene::SourceImage;
pub use selection::GroupId;
pub use session::StitchSession;
pub use settings::Settings;

/// Loads `.env` files if present.
///
/// Call this once at application startup before reading configuration.
pub fn init() {
    let _ = dotenvy::dotenv();
}
