use std::ffi::OsString;
use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};

use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use jiff::Timestamp;
use orbis_core::GdpRank;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CatalogError, Result};
use crate::upsert::ReadBack;

pub const WIDTH: u32 = 800;
pub const HEIGHT: u32 = 400;
pub const FILE_NAME: &str = "summary.png";
/// iTXt keyword under which the rendered summary is embedded as JSON.
pub const SUMMARY_KEYWORD: &str = "orbis:summary";

const STAGING_SUFFIX: &str = ".partial";
const MARGIN_X: u32 = 50;
const BLACK: [u8; 3] = [0x00, 0x00, 0x00];
const WHITE: [u8; 3] = [0xFF, 0xFF, 0xFF];

/// Everything drawn on the summary image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub total: u64,
    pub top: Vec<GdpRank>,
    pub generated_at: Timestamp,
}

impl SummaryReport {
    pub fn new(read_back: ReadBack, generated_at: Timestamp) -> Self {
        Self {
            total: read_back.total,
            top: read_back.top,
            generated_at,
        }
    }
}

/// `$<integer amount>`, or `N/A` when there is no estimate.
pub fn format_gdp(estimated_gdp: Option<f64>) -> String {
    match estimated_gdp {
        Some(gdp) => format!("${gdp:.0}"),
        None => "N/A".to_string(),
    }
}

struct Canvas {
    pixels: Vec<u8>,
}

impl Canvas {
    fn new(background: [u8; 3]) -> Self {
        let pixels = background
            .iter()
            .copied()
            .cycle()
            .take((WIDTH * HEIGHT * 3) as usize)
            .collect();
        Self { pixels }
    }

    fn put(&mut self, x: u32, y: u32, color: [u8; 3]) {
        if x >= WIDTH || y >= HEIGHT {
            return;
        }
        let offset = ((y * WIDTH + x) * 3) as usize;
        self.pixels[offset..offset + 3].copy_from_slice(&color);
    }

    fn fill(&mut self, x: u32, y: u32, size: u32, color: [u8; 3]) {
        for dy in 0..size {
            for dx in 0..size {
                self.put(x + dx, y + dy, color);
            }
        }
    }

    /// Draws `text` with its top-left corner at (`x`, `y`), each font pixel
    /// scaled to a `scale`×`scale` block. Text running off the canvas is clipped.
    fn text(&mut self, x: u32, y: u32, scale: u32, bold: bool, text: &str) {
        let advance = 8 * scale;
        for (index, ch) in text.chars().enumerate() {
            let origin = x + index as u32 * advance;
            if origin >= WIDTH {
                break;
            }
            for (row, bits) in glyph(ch).iter().enumerate() {
                for col in 0..8 {
                    if bits & (1 << col) == 0 {
                        continue;
                    }
                    let px = origin + col * scale;
                    let py = y + row as u32 * scale;
                    self.fill(px, py, scale, BLACK);
                    if bold {
                        self.fill(px + 1, py, scale, BLACK);
                    }
                }
            }
        }
    }
}

fn glyph(ch: char) -> [u8; 8] {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

fn draw(report: &SummaryReport) -> Canvas {
    let mut canvas = Canvas::new(WHITE);

    canvas.text(MARGIN_X, 26, 3, true, "Country GDP Summary");
    canvas.text(
        MARGIN_X,
        84,
        2,
        false,
        &format!("Total Countries: {}", report.total),
    );
    canvas.text(
        MARGIN_X,
        114,
        2,
        false,
        &format!("Last Refresh: {}", report.generated_at),
    );
    canvas.text(MARGIN_X, 160, 2, true, "Top 5 Countries by Estimated GDP:");

    for (index, rank) in report.top.iter().enumerate() {
        let line = format!("{}: {}", rank.name, format_gdp(rank.estimated_gdp));
        canvas.text(MARGIN_X, 194 + index as u32 * 30, 2, false, &line);
    }

    canvas
}

fn render_error(err: impl std::fmt::Display) -> CatalogError {
    CatalogError::ArtifactWriteFailed(format!("render: {err}"))
}

/// Renders the summary as an 800×400 PNG with the report embedded as JSON
/// in an iTXt chunk keyed [`SUMMARY_KEYWORD`].
pub fn render_png(report: &SummaryReport) -> Result<Vec<u8>> {
    let canvas = draw(report);
    let metadata = serde_json::to_string(report).map_err(render_error)?;

    let mut bytes = Vec::new();
    let mut encoder = png::Encoder::new(&mut bytes, WIDTH, HEIGHT);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    encoder
        .add_itxt_chunk(SUMMARY_KEYWORD.to_string(), metadata)
        .map_err(render_error)?;

    let mut writer = encoder.write_header().map_err(render_error)?;
    writer
        .write_image_data(&canvas.pixels)
        .map_err(render_error)?;
    writer.finish().map_err(render_error)?;

    Ok(bytes)
}

/// Extracts the report embedded by [`render_png`], if any.
pub fn read_embedded_report(png_bytes: &[u8]) -> Option<SummaryReport> {
    let mut decoder = png::Decoder::new(Cursor::new(png_bytes));
    decoder.set_ignore_text_chunk(false);
    let reader = decoder.read_info().ok()?;

    let text = reader
        .info()
        .utf8_text
        .iter()
        .find(|chunk| chunk.keyword == SUMMARY_KEYWORD)?
        .get_text()
        .ok()?;

    serde_json::from_str(&text).ok()
}

/// The summary image in the cache directory.
///
/// A refresh writes the image to a staging file next to the final path
/// ([`SummaryArtifact::stage`]) while its transaction is open, then moves it
/// into place once the transaction has committed ([`SummaryArtifact::publish`]).
#[derive(Debug, Clone)]
pub struct SummaryArtifact {
    path: PathBuf,
}

impl SummaryArtifact {
    pub fn in_dir(cache_dir: impl AsRef<Path>) -> Self {
        Self {
            path: cache_dir.as_ref().join(FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn staging_path(&self) -> PathBuf {
        let mut staging = OsString::from(self.path.as_os_str());
        staging.push(STAGING_SUFFIX);
        PathBuf::from(staging)
    }

    /// Renders `report` and writes it to the staging path.
    pub async fn stage(&self, report: &SummaryReport) -> Result<()> {
        let bytes = render_png(report)?;
        let write_failed = |err: std::io::Error| {
            CatalogError::ArtifactWriteFailed(format!("{}: {err}", self.staging_path().display()))
        };

        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await.map_err(write_failed)?;
        }
        tokio::fs::write(self.staging_path(), bytes)
            .await
            .map_err(write_failed)?;

        debug!(path = %self.staging_path().display(), "summary image staged");
        Ok(())
    }

    /// Replaces the published image with the staged one.
    pub async fn publish(&self) -> std::io::Result<()> {
        tokio::fs::rename(self.staging_path(), &self.path).await
    }

    /// Removes the staged image, if any.
    pub async fn discard(&self) {
        match tokio::fs::remove_file(self.staging_path()).await {
            Ok(()) => debug!("staged summary image discarded"),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => warn!(error = %err, "failed to discard staged summary image"),
        }
    }

    /// Reads the published image.
    pub async fn read(&self) -> Result<Vec<u8>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(CatalogError::ArtifactNotFound),
            Err(err) => Err(CatalogError::ArtifactUnreadable(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> SummaryReport {
        SummaryReport {
            total: 250,
            top: vec![
                GdpRank {
                    name: "Côte d'Ivoire".to_string(),
                    estimated_gdp: Some(123_456_789.6),
                },
                GdpRank {
                    name: "Nowhere".to_string(),
                    estimated_gdp: None,
                },
            ],
            generated_at: "2025-01-02T03:04:05Z".parse().unwrap(),
        }
    }

    #[test]
    fn formats_gdp_as_integer_amount() {
        assert_eq!(format_gdp(Some(123_456_789.6)), "$123456790");
        assert_eq!(format_gdp(Some(0.2)), "$0");
        assert_eq!(format_gdp(None), "N/A");
    }

    #[test]
    fn renders_fixed_size_png_with_embedded_report() {
        let bytes = render_png(&report()).unwrap();

        let decoder = png::Decoder::new(Cursor::new(bytes.as_slice()));
        let reader = decoder.read_info().unwrap();
        assert_eq!(reader.info().width, WIDTH);
        assert_eq!(reader.info().height, HEIGHT);

        assert_eq!(read_embedded_report(&bytes), Some(report()));
    }

    #[test]
    fn draws_text_onto_the_canvas() {
        let canvas = draw(&report());
        let ink = canvas.pixels.chunks(3).filter(|px| *px == BLACK).count();
        assert!(ink > 0);

        let blank = Canvas::new(WHITE);
        assert!(blank.pixels.chunks(3).all(|px| px == WHITE));
    }

    #[tokio::test]
    async fn stage_then_publish_moves_image_into_place() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = SummaryArtifact::in_dir(dir.path().join("cache"));

        artifact.stage(&report()).await.unwrap();
        assert!(artifact.staging_path().exists());
        assert!(matches!(
            artifact.read().await,
            Err(CatalogError::ArtifactNotFound)
        ));

        artifact.publish().await.unwrap();
        assert!(!artifact.staging_path().exists());
        let bytes = artifact.read().await.unwrap();
        assert_eq!(read_embedded_report(&bytes), Some(report()));
    }

    #[tokio::test]
    async fn discard_removes_staged_image() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = SummaryArtifact::in_dir(dir.path());

        artifact.discard().await;
        artifact.stage(&report()).await.unwrap();
        artifact.discard().await;

        assert!(!artifact.staging_path().exists());
    }

    #[tokio::test]
    async fn stage_fails_when_cache_dir_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let err = SummaryArtifact::in_dir(&blocker)
            .stage(&report())
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::ArtifactWriteFailed(_)));
    }
}
