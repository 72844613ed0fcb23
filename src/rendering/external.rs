//! Raster transforms delegated to an external command.
//!
//! The command is given as an argv template. Placeholders are substituted
//! per argument before spawning:
//!
//! | Placeholder | Value                                         |
//! |-------------|-----------------------------------------------|
//! | `{input}`   | scratch file holding the stage input          |
//! | `{output}`  | scratch PNG the command must write            |
//! | `{palette}` | PNG swatch, one pixel per palette color       |
//! | `{width}`   | canvas width                                  |
//! | `{height}`  | canvas height                                 |
//! | `{filter}`  | resize filter name, empty unless one is set   |
//!
//! Only the normalize stage resizes, so only it is built with a filter.
//! Scratch files are deleted when the call returns.

use std::io::Write;
use std::path::Path;
use std::process::Command;

use image::{ImageFormat, ImageReader, RgbImage};
use panel_encode::{
    EncodeError, Normalize, Palette, Quantize, ResizeFilter, PANEL_HEIGHT, PANEL_WIDTH,
};
use tempfile::NamedTempFile;

/// Runs an external program as the normalize or quantize stage.
#[derive(Debug, Clone)]
pub struct CommandTransform {
    argv: Vec<String>,
    width: u32,
    height: u32,
    filter: Option<ResizeFilter>,
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Normalize,
    Quantize,
}

impl Stage {
    fn error(self, message: String) -> EncodeError {
        match self {
            Stage::Normalize => EncodeError::Resize(message),
            Stage::Quantize => EncodeError::Quantize(message),
        }
    }
}

impl CommandTransform {
    /// Build from an argv template; `None` when the template is empty.
    pub fn new(argv: Vec<String>) -> Option<Self> {
        if argv.is_empty() {
            return None;
        }
        Some(Self {
            argv,
            width: PANEL_WIDTH,
            height: PANEL_HEIGHT,
            filter: None,
        })
    }

    /// Resize filter substituted for `{filter}`.
    pub fn filter(mut self, filter: ResizeFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    fn expand(&self, input: &Path, output: &Path, palette: Option<&Path>) -> Vec<String> {
        let palette = palette.map(|p| p.display().to_string()).unwrap_or_default();
        self.argv
            .iter()
            .map(|arg| {
                arg.replace("{input}", &input.display().to_string())
                    .replace("{output}", &output.display().to_string())
                    .replace("{palette}", &palette)
                    .replace("{width}", &self.width.to_string())
                    .replace("{height}", &self.height.to_string())
                    .replace("{filter}", self.filter.map(ResizeFilter::name).unwrap_or_default())
            })
            .collect()
    }

    fn run(
        &self,
        stage: Stage,
        input: &NamedTempFile,
        palette: Option<&NamedTempFile>,
    ) -> Result<RgbImage, EncodeError> {
        let output = scratch(".png").map_err(|e| stage.error(e.to_string()))?;
        let args = self.expand(input.path(), output.path(), palette.map(|p| p.path()));

        tracing::debug!(?stage, command = ?args, "Running external transform");
        let result = Command::new(&args[0])
            .args(&args[1..])
            .output()
            .map_err(|e| stage.error(format!("failed to start '{}': {e}", args[0])))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            tracing::warn!(?stage, status = %result.status, stderr = %stderr.trim(), "External transform failed");
            return Err(stage.error(format!(
                "'{}' exited with {}: {}",
                args[0],
                result.status,
                stderr.trim()
            )));
        }

        let img = ImageReader::open(output.path())
            .and_then(|reader| reader.with_guessed_format())
            .map_err(image::ImageError::from)
            .and_then(|reader| reader.decode())
            .map_err(|e| stage.error(format!("unreadable output from '{}': {e}", args[0])))?;
        Ok(img.to_rgb8())
    }
}

impl Normalize for CommandTransform {
    fn normalize(&self, encoded: &[u8]) -> Result<RgbImage, EncodeError> {
        if encoded.is_empty() {
            return Err(EncodeError::Decode("empty input".to_string()));
        }
        // Reject undecodable uploads here so they surface as decode errors
        image::guess_format(encoded)?;

        let mut input = scratch("").map_err(|e| EncodeError::Resize(e.to_string()))?;
        input
            .write_all(encoded)
            .and_then(|_| input.flush())
            .map_err(|e| EncodeError::Resize(e.to_string()))?;
        self.run(Stage::Normalize, &input, None)
    }
}

impl Quantize for CommandTransform {
    fn quantize(&self, raster: &RgbImage, palette: &Palette) -> Result<RgbImage, EncodeError> {
        let input = write_png(raster).map_err(|e| EncodeError::Quantize(e.to_string()))?;
        let swatch = write_png(&swatch(palette)).map_err(|e| EncodeError::Quantize(e.to_string()))?;
        self.run(Stage::Quantize, &input, Some(&swatch))
    }
}

fn scratch(suffix: &str) -> std::io::Result<NamedTempFile> {
    tempfile::Builder::new()
        .prefix("inkframe-")
        .suffix(suffix)
        .tempfile()
}

fn write_png(img: &RgbImage) -> Result<NamedTempFile, image::ImageError> {
    let file = scratch(".png")?;
    img.save_with_format(file.path(), ImageFormat::Png)?;
    Ok(file)
}

/// One pixel per palette color, in palette order.
fn swatch(palette: &Palette) -> RgbImage {
    let colors = palette.colors();
    RgbImage::from_fn(colors.len().max(1) as u32, 1, |x, _| {
        colors
            .get(x as usize)
            .map(|c| image::Rgb::from(c.rgb()))
            .unwrap_or(image::Rgb([0, 0, 0]))
    })
}
