//! QR code rendering for payment request payloads
//! Output is a PNG, an SVG document, or unicode text for a terminal.

use base64::{engine::general_purpose::STANDARD, Engine};
use image::{ImageEncoder, Rgb};
use qrcode::QrCode;

use crate::intent::PaymentIntent;
use crate::token::TokenDescriptor;
use crate::QrError;

const DEFAULT_DARK: &str = "#000000";
const DEFAULT_LIGHT: &str = "#FFFFFF";

/// QR code output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QrFormat {
    #[default]
    Png,
    Svg,
    Terminal,
}

#[derive(Debug, Clone)]
pub struct QrOptions {
    /// Minimum image size in pixels (PNG and SVG)
    pub size: u32,
    /// Draw the standard four-module margin around the code
    pub quiet_zone: bool,
    pub format: QrFormat,
    /// Module color, `#RRGGBB`
    pub dark_color: String,
    /// Background color, `#RRGGBB`
    pub light_color: String,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            size: 300,
            quiet_zone: true,
            format: QrFormat::Png,
            dark_color: DEFAULT_DARK.to_string(),
            light_color: DEFAULT_LIGHT.to_string(),
        }
    }
}

impl QrOptions {
    /// Options tinted with the token's brand color
    pub fn for_token(token: &TokenDescriptor) -> Self {
        Self {
            dark_color: token
                .display_color
                .clone()
                .unwrap_or_else(|| DEFAULT_DARK.to_string()),
            ..Self::default()
        }
    }

    pub fn with_format(mut self, format: QrFormat) -> Self {
        self.format = format;
        self
    }
}

/// Rendered QR code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrImage {
    Png(Vec<u8>),
    Svg(String),
    Terminal(String),
}

impl QrImage {
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            QrImage::Png(bytes) => bytes,
            QrImage::Svg(text) | QrImage::Terminal(text) => text.into_bytes(),
        }
    }
}

/// Render `payload` as a QR code
pub fn render(payload: &str, options: &QrOptions) -> Result<QrImage, QrError> {
    let code = QrCode::new(payload.as_bytes())?;

    match options.format {
        QrFormat::Png => render_png(&code, options).map(QrImage::Png),
        QrFormat::Svg => render_svg(&code, options).map(QrImage::Svg),
        QrFormat::Terminal => Ok(QrImage::Terminal(render_terminal(&code, options))),
    }
}

fn parse_color(hex: &str) -> Result<Rgb<u8>, QrError> {
    let invalid = || QrError::InvalidColor(hex.to_string());
    let digits = hex.strip_prefix('#').ok_or_else(invalid)?;
    if digits.len() != 6 || !digits.is_ascii() {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());
    Ok(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}

fn render_png(code: &QrCode, options: &QrOptions) -> Result<Vec<u8>, QrError> {
    let image = code
        .render::<Rgb<u8>>()
        .quiet_zone(options.quiet_zone)
        .min_dimensions(options.size, options.size)
        .dark_color(parse_color(&options.dark_color)?)
        .light_color(parse_color(&options.light_color)?)
        .build();

    let mut bytes = Vec::new();
    image::codecs::png::PngEncoder::new(&mut bytes).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgb8,
    )?;

    Ok(bytes)
}

fn render_svg(code: &QrCode, options: &QrOptions) -> Result<String, QrError> {
    // Same validation as PNG so a bad color fails in every format
    parse_color(&options.dark_color)?;
    parse_color(&options.light_color)?;

    Ok(code
        .render()
        .quiet_zone(options.quiet_zone)
        .min_dimensions(options.size, options.size)
        .dark_color(qrcode::render::svg::Color(&options.dark_color))
        .light_color(qrcode::render::svg::Color(&options.light_color))
        .build())
}

fn render_terminal(code: &QrCode, options: &QrOptions) -> String {
    code.render::<char>()
        .quiet_zone(options.quiet_zone)
        .module_dimensions(2, 1)
        .build()
}

/// Embed PNG bytes as a `data:` URI
pub fn data_uri(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png))
}

/// Suggested file name when saving a request's QR code
pub fn download_file_name(intent: &PaymentIntent) -> String {
    format!("payment-qr-{}-{}.png", intent.amount, intent.token_symbol)
}
