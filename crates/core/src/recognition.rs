//! The text-recognition seam and the split of its output back into groups.

use crate::error::Result;
use crate::image_processing::EncodedSnapshot;
use crate::selection::GroupId;
use std::future::Future;

/// Default instruction sent along with a composite snapshot.
pub const DEFAULT_PROMPT: &str = "Transcribe all text in this image exactly as written. \
The image is made of stacked regions separated by solid dark horizontal bands. \
Output the regions top to bottom and write the line {separator} on its own line \
wherever a band separates two regions. Output only the transcription.";

/// Turns a rendered composite into one delimited string.
pub trait TextRecognizer {
    fn recognize(
        &self,
        snapshot: &EncodedSnapshot,
        prompt: &str,
    ) -> impl Future<Output = Result<String>>;
}

/// Fills the prompt template with the separator token.
pub fn build_prompt(template: &str, separator: &str) -> String {
    template.replace("{separator}", separator)
}

/// Splits recognized text into one segment per stacked group.
///
/// Segments are trimmed and assigned in `order`. Surplus segments are
/// appended to the last group; groups without a segment (or missing from
/// `order`) get an empty string.
pub fn split_recognized_text(
    text: &str,
    separator: &str,
    order: &[GroupId],
) -> [String; GroupId::COUNT] {
    let mut result: [String; GroupId::COUNT] = Default::default();
    let Some((&last, leading)) = order.split_last() else {
        return result;
    };

    let mut segments = text.split(separator).map(str::trim);
    for &group in leading {
        result[group.index()] = segments.next().unwrap_or_default().to_string();
    }
    let rest: Vec<&str> = segments.filter(|s| !s.is_empty()).collect();
    result[last.index()] = rest.join("\n");
    result
}
