//! Headless browser access for printing HTML to PDF.
//!
//! The converter talks to the browser through [`Browser`] and
//! [`BrowserSession`]. A session is exclusively owned by one conversion: it is
//! launched, given one page of content, asked for one PDF, and closed.
//! [`Chrome`] is the implementation used by the binary.

mod chrome;
pub use chrome::Chrome;

use anyhow::Result;

/// Something that can start a browser session.
pub trait Browser {
    type Session: BrowserSession;

    /// Start a new session with the given page viewport.
    fn launch(&self, viewport: Viewport) -> Result<Self::Session>;
}

/// A single launched browser, owning one page.
pub trait BrowserSession {
    /// Load an HTML document into the page.
    fn set_content(&mut self, html: &str) -> Result<()>;

    /// Print the loaded page, returning the PDF bytes.
    fn export_pdf(&mut self, options: &PdfOptions) -> Result<Vec<u8>>;

    /// Shut the browser down and release everything the session holds.
    fn close(self) -> Result<()>;
}

/// The logical viewport of the page before printing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Width in CSS pixels
    pub width: u32,
    /// Height in CSS pixels
    pub height: u32,
    pub device_scale_factor: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport {
            width: 1200,
            height: 1600,
            device_scale_factor: 2.0,
        }
    }
}

/// Physical paper size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_mm: f32,
    pub height_mm: f32,
}

impl PageSize {
    pub const A4: PageSize = PageSize {
        width_mm: 210.0,
        height_mm: 297.0,
    };
}

/// Page margins in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top_mm: f32,
    pub right_mm: f32,
    pub bottom_mm: f32,
    pub left_mm: f32,
}

impl Margins {
    pub fn uniform_cm(cm: f32) -> Margins {
        let mm = cm * 10.0;
        Margins {
            top_mm: mm,
            right_mm: mm,
            bottom_mm: mm,
            left_mm: mm,
        }
    }
}

/// PDF export settings.
///
/// The defaults are the only settings the converter uses: A4 with 2 cm
/// margins, backgrounds printed, unscaled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfOptions {
    pub page_size: PageSize,
    pub margins: Margins,
    pub print_background: bool,
    pub scale: f32,
}

impl Default for PdfOptions {
    fn default() -> Self {
        PdfOptions {
            page_size: PageSize::A4,
            margins: Margins::uniform_cm(2.0),
            print_background: true,
            scale: 1.0,
        }
    }
}

impl PdfOptions {
    /// The print stylesheet that applies these options inside the page.
    pub fn print_stylesheet(&self) -> String {
        let PageSize {
            width_mm,
            height_mm,
        } = self.page_size;
        let Margins {
            top_mm,
            right_mm,
            bottom_mm,
            left_mm,
        } = self.margins;
        let color_adjust = if self.print_background {
            "exact"
        } else {
            "economy"
        };

        format!(
            "@page {{ size: {width_mm}mm {height_mm}mm; margin: {top_mm}mm {right_mm}mm {bottom_mm}mm {left_mm}mm; }}\n\
             html {{ zoom: {scale}; }}\n\
             * {{ -webkit-print-color-adjust: {color_adjust}; print-color-adjust: {color_adjust}; }}\n",
            scale = self.scale,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_a4_with_2cm_margins() {
        let options = PdfOptions::default();
        assert_eq!(options.page_size, PageSize::A4);
        assert_eq!(options.margins, Margins::uniform_cm(2.0));
        assert_eq!(options.margins.left_mm, 20.0);
        assert!(options.print_background);
    }

    #[test]
    fn print_stylesheet_carries_geometry() {
        let css = PdfOptions::default().print_stylesheet();
        assert!(css.contains("size: 210mm 297mm;"));
        assert!(css.contains("margin: 20mm 20mm 20mm 20mm;"));
        assert!(css.contains("zoom: 1;"));
        assert!(css.contains("print-color-adjust: exact;"));
    }

    #[test]
    fn backgrounds_can_be_dropped() {
        let options = PdfOptions {
            print_background: false,
            ..PdfOptions::default()
        };
        assert!(options.print_stylesheet().contains("print-color-adjust: economy;"));
    }
}
