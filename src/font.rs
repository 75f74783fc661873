// Boost/Apache2 License

//! Font faces, scaled fonts and font options.
//!
//! The library has no font engine, so fonts are resources only: they can be created,
//! selected into a context and queried, but not drawn.

use crate::context::Antialias;
use crate::geometry::Matrix;
use crate::handle::{CopyableHandle, SharedHandle};
use crate::status::Status;
use crate::sys;
use crate::Error;

use core::convert::TryFrom;
use core::hash::{Hash, Hasher};
use core::ops::Deref;

raw_enum! {
    /// Slant of a toy font.
    pub enum FontSlant {
        Normal = sys::FONT_SLANT_NORMAL,
        Italic = sys::FONT_SLANT_ITALIC,
        Oblique = sys::FONT_SLANT_OBLIQUE,
    }
}

raw_enum! {
    /// Weight of a toy font.
    pub enum FontWeight {
        Normal = sys::FONT_WEIGHT_NORMAL,
        Bold = sys::FONT_WEIGHT_BOLD,
    }
}

raw_enum! {
    /// The order of color elements within a pixel, for subpixel antialiasing.
    pub enum SubpixelOrder {
        Default = sys::SUBPIXEL_ORDER_DEFAULT,
        Rgb = sys::SUBPIXEL_ORDER_RGB,
        Bgr = sys::SUBPIXEL_ORDER_BGR,
        Vrgb = sys::SUBPIXEL_ORDER_VRGB,
        Vbgr = sys::SUBPIXEL_ORDER_VBGR,
    }
}

raw_enum! {
    /// How strongly outlines are fitted to the pixel grid.
    pub enum HintStyle {
        Default = sys::HINT_STYLE_DEFAULT,
        None = sys::HINT_STYLE_NONE,
        Slight = sys::HINT_STYLE_SLIGHT,
        Medium = sys::HINT_STYLE_MEDIUM,
        Full = sys::HINT_STYLE_FULL,
    }
}

raw_enum! {
    /// Whether font metrics are rounded to whole device units.
    pub enum HintMetrics {
        Default = sys::HINT_METRICS_DEFAULT,
        Off = sys::HINT_METRICS_OFF,
        On = sys::HINT_METRICS_ON,
    }
}

raw_enum! {
    /// Backend of a font face or scaled font.
    pub enum FontType {
        Toy = sys::FONT_TYPE_TOY,
    }
}

/// How fonts should be rendered. Clones are independent copies.
#[derive(Debug, Clone)]
pub struct FontOptions {
    handle: CopyableHandle<sys::RawFontOptions>,
}

impl FontOptions {
    /// Options with every setting at its default.
    pub fn new() -> Self {
        Self {
            handle: unsafe { CopyableHandle::from_raw(sys::font_options_create()) },
        }
    }

    /// Wrap an owned options object.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a live font options object the caller owns.
    pub unsafe fn from_raw(ptr: *mut sys::RawFontOptions) -> Self {
        Self {
            handle: CopyableHandle::from_raw(ptr),
        }
    }

    /// The underlying options pointer.
    pub fn as_ptr(&self) -> *mut sys::RawFontOptions {
        self.handle.as_ptr()
    }

    /// The sticky error status.
    pub fn status(&self) -> Status {
        Status::from_raw(unsafe { sys::font_options_status(self.as_ptr()) })
    }

    /// Override these options with every non-default setting of `other`.
    pub fn merge(&mut self, other: &FontOptions) {
        unsafe { sys::font_options_merge(self.as_ptr(), other.as_ptr()) }
    }

    /// A hash of the settings. Equal options hash equally.
    pub fn hash_value(&self) -> u64 {
        unsafe { sys::font_options_hash(self.as_ptr()) }
    }

    /// Set the antialiasing mode for glyphs.
    pub fn set_antialias(&mut self, antialias: Antialias) {
        unsafe { sys::font_options_set_antialias(self.as_ptr(), antialias.into_raw()) }
    }

    /// The antialiasing mode for glyphs.
    pub fn antialias(&self) -> Antialias {
        let raw = unsafe { sys::font_options_get_antialias(self.as_ptr()) };
        Antialias::from_raw(raw).unwrap_or(Antialias::Default)
    }

    /// Set the subpixel order for subpixel antialiasing.
    pub fn set_subpixel_order(&mut self, order: SubpixelOrder) {
        unsafe { sys::font_options_set_subpixel_order(self.as_ptr(), order.into_raw()) }
    }

    /// The subpixel order.
    pub fn subpixel_order(&self) -> SubpixelOrder {
        let raw = unsafe { sys::font_options_get_subpixel_order(self.as_ptr()) };
        SubpixelOrder::from_raw(raw).unwrap_or(SubpixelOrder::Default)
    }

    /// Set how strongly outlines are hinted.
    pub fn set_hint_style(&mut self, style: HintStyle) {
        unsafe { sys::font_options_set_hint_style(self.as_ptr(), style.into_raw()) }
    }

    /// The hint style.
    pub fn hint_style(&self) -> HintStyle {
        let raw = unsafe { sys::font_options_get_hint_style(self.as_ptr()) };
        HintStyle::from_raw(raw).unwrap_or(HintStyle::Default)
    }

    /// Set whether metrics are rounded to whole pixels.
    pub fn set_hint_metrics(&mut self, metrics: HintMetrics) {
        unsafe { sys::font_options_set_hint_metrics(self.as_ptr(), metrics.into_raw()) }
    }

    /// The metric hinting mode.
    pub fn hint_metrics(&self) -> HintMetrics {
        let raw = unsafe { sys::font_options_get_hint_metrics(self.as_ptr()) };
        HintMetrics::from_raw(raw).unwrap_or(HintMetrics::Default)
    }

    /// Font variation settings, such as `"wght=700,wdth=80"`.
    pub fn set_variations(&mut self, variations: Option<&str>) {
        unsafe { sys::font_options_set_variations(self.as_ptr(), variations) }
    }

    /// The font variation settings, if any were set.
    pub fn variations(&self) -> Option<String> {
        unsafe { sys::font_options_get_variations(self.as_ptr()) }
    }
}

impl Default for FontOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for FontOptions {
    fn eq(&self, other: &Self) -> bool {
        unsafe { sys::font_options_equal(self.as_ptr(), other.as_ptr()) }
    }
}

impl Eq for FontOptions {}

impl Hash for FontOptions {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash_value().hash(state);
    }
}

/// A font family and style.
#[derive(Debug, Clone, Default)]
pub struct FontFace {
    handle: SharedHandle<sys::RawFontFace>,
}

impl FontFace {
    /// Wrap an owned font face.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a live font face whose count the caller owns.
    pub unsafe fn from_raw(ptr: *mut sys::RawFontFace) -> Self {
        Self {
            handle: SharedHandle::from_raw(ptr),
        }
    }

    /// Wrap a borrowed font face, adding a reference.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a live font face.
    pub unsafe fn from_raw_shared(ptr: *mut sys::RawFontFace) -> Self {
        Self {
            handle: SharedHandle::from_raw_shared(ptr),
        }
    }

    /// The underlying face pointer.
    pub fn as_ptr(&self) -> *mut sys::RawFontFace {
        self.handle.as_ptr()
    }

    /// The sticky error status.
    pub fn status(&self) -> Status {
        Status::from_raw(unsafe { sys::font_face_status(self.as_ptr()) })
    }

    /// The backend of this font.
    pub fn font_type(&self) -> FontType {
        let raw = unsafe { sys::font_face_get_type(self.as_ptr()) };
        FontType::from_raw(raw).unwrap_or(FontType::Toy)
    }

    /// View this face as a toy face, sharing it. Fails only for an empty face.
    pub fn as_toy(&self) -> Result<ToyFontFace, Error> {
        ToyFontFace::try_from(self.clone())
    }

    /// Convert into a toy face. Fails only for an empty face.
    pub fn into_toy(self) -> Result<ToyFontFace, Error> {
        ToyFontFace::try_from(self)
    }

    /// Number of live references.
    pub fn reference_count(&self) -> u32 {
        self.handle.reference_count()
    }
}

/// A font face picked by family name, slant and weight.
#[derive(Debug, Clone, Default)]
pub struct ToyFontFace(FontFace);

impl ToyFontFace {
    /// Check [`FontFace::status`] for invalid slants or weights.
    pub fn create(family: &str, slant: FontSlant, weight: FontWeight) -> Self {
        Self(unsafe {
            FontFace::from_raw(sys::toy_font_face_create(
                family,
                slant.into_raw(),
                weight.into_raw(),
            ))
        })
    }

    /// The family name the face was created with.
    pub fn family(&self) -> String {
        unsafe { sys::toy_font_face_get_family(self.as_ptr()) }
    }

    /// The requested slant.
    pub fn slant(&self) -> FontSlant {
        let raw = unsafe { sys::toy_font_face_get_slant(self.as_ptr()) };
        FontSlant::from_raw(raw).unwrap_or(FontSlant::Normal)
    }

    /// The requested weight.
    pub fn weight(&self) -> FontWeight {
        let raw = unsafe { sys::toy_font_face_get_weight(self.as_ptr()) };
        FontWeight::from_raw(raw).unwrap_or(FontWeight::Normal)
    }
}

impl Deref for ToyFontFace {
    type Target = FontFace;

    fn deref(&self) -> &FontFace {
        &self.0
    }
}

impl From<ToyFontFace> for FontFace {
    fn from(face: ToyFontFace) -> Self {
        face.0
    }
}

/// Toy faces are the only kind the library creates, so today this fails only for an
/// empty handle, with [`Status::NullPointer`].
impl TryFrom<FontFace> for ToyFontFace {
    type Error = Error;

    fn try_from(face: FontFace) -> Result<Self, Error> {
        const FUNCTION: &str = "font_face_get_type";

        if face.handle.is_empty() {
            return Err(Error::new(Status::NullPointer, FUNCTION));
        }

        let raw = unsafe { sys::font_face_get_type(face.as_ptr()) };
        if raw == sys::FONT_TYPE_TOY {
            Ok(Self(face))
        } else {
            Err(Error::new(Status::FontTypeMismatch, FUNCTION))
        }
    }
}

/// A font face at a particular size and transform.
#[derive(Debug, Clone, Default)]
pub struct ScaledFont {
    handle: SharedHandle<sys::RawScaledFont>,
}

impl ScaledFont {
    /// Scale `face` by `font_matrix` and then `ctm`. Check [`ScaledFont::status`] for
    /// singular matrices.
    pub fn create(face: &FontFace, font_matrix: &Matrix, ctm: &Matrix, options: &FontOptions) -> Self {
        let (font_matrix, ctm) = (sys::RawMatrix::from(*font_matrix), sys::RawMatrix::from(*ctm));
        Self {
            handle: unsafe {
                SharedHandle::from_raw(sys::scaled_font_create(
                    face.as_ptr(),
                    &font_matrix,
                    &ctm,
                    options.as_ptr(),
                ))
            },
        }
    }

    /// Wrap a borrowed scaled font, adding a reference.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a live scaled font.
    pub unsafe fn from_raw_shared(ptr: *mut sys::RawScaledFont) -> Self {
        Self {
            handle: SharedHandle::from_raw_shared(ptr),
        }
    }

    /// The underlying scaled font pointer.
    pub fn as_ptr(&self) -> *mut sys::RawScaledFont {
        self.handle.as_ptr()
    }

    /// The sticky error status.
    pub fn status(&self) -> Status {
        Status::from_raw(unsafe { sys::scaled_font_status(self.as_ptr()) })
    }

    /// The backend of this font.
    pub fn font_type(&self) -> FontType {
        let raw = unsafe { sys::scaled_font_get_type(self.as_ptr()) };
        FontType::from_raw(raw).unwrap_or(FontType::Toy)
    }

    /// The face this font was created from.
    pub fn font_face(&self) -> FontFace {
        unsafe { FontFace::from_raw_shared(sys::scaled_font_get_font_face(self.as_ptr())) }
    }

    /// The font matrix this font was created with.
    pub fn font_matrix(&self) -> Matrix {
        unsafe { sys::scaled_font_get_font_matrix(self.as_ptr()) }.into()
    }

    /// The transform the font was created for, without its translation.
    pub fn ctm(&self) -> Matrix {
        unsafe { sys::scaled_font_get_ctm(self.as_ptr()) }.into()
    }

    /// The font matrix followed by the ctm.
    pub fn scale_matrix(&self) -> Matrix {
        unsafe { sys::scaled_font_get_scale_matrix(self.as_ptr()) }.into()
    }

    /// A copy of the options this font was created with.
    pub fn font_options(&self) -> FontOptions {
        let options = FontOptions::new();
        unsafe { sys::scaled_font_get_font_options(self.as_ptr(), options.as_ptr()) };
        options
    }

    /// Number of live references.
    pub fn reference_count(&self) -> u32 {
        self.handle.reference_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_are_independent() {
        let mut a = FontOptions::new();
        a.set_hint_style(HintStyle::Slight);

        let mut b = a.clone();
        assert_eq!(a, b);
        b.set_hint_style(HintStyle::Full);
        b.set_variations(Some("wght=700"));

        assert_eq!(a.hint_style(), HintStyle::Slight);
        assert_eq!(a.variations(), None);
        assert_ne!(a, b);
    }

    #[test]
    fn merge_takes_non_defaults() {
        let mut base = FontOptions::new();
        base.set_antialias(Antialias::Gray);

        let mut other = FontOptions::new();
        other.set_hint_metrics(HintMetrics::On);

        base.merge(&other);
        assert_eq!(base.antialias(), Antialias::Gray);
        assert_eq!(base.hint_metrics(), HintMetrics::On);
        assert_ne!(base.hash_value(), FontOptions::new().hash_value());
    }

    #[test]
    fn toy_faces_downcast() {
        let face: FontFace = ToyFontFace::create("serif", FontSlant::Italic, FontWeight::Bold).into();
        assert_eq!(face.status(), Status::Success);
        assert_eq!(face.font_type(), FontType::Toy);

        let toy = face.as_toy().unwrap();
        assert_eq!(toy.family(), "serif");
        assert_eq!(toy.slant(), FontSlant::Italic);
        assert_eq!(toy.weight(), FontWeight::Bold);
        assert_eq!(face.reference_count(), 2);
    }

    #[test]
    fn empty_faces_are_not_toys() {
        let err = FontFace::default().into_toy().unwrap_err();
        assert_eq!(err.status(), Status::NullPointer);
    }

    #[test]
    fn scaled_fonts_combine_matrices() {
        let face = ToyFontFace::create("sans-serif", FontSlant::Normal, FontWeight::Normal);
        let mut ctm = Matrix::scaling(2.0, 3.0);
        ctm.x0 = 50.0;
        let font = ScaledFont::create(&face, &Matrix::scaling(12.0, 12.0), &ctm, &FontOptions::new());

        assert_eq!(font.status(), Status::Success);
        assert_eq!(font.ctm(), Matrix::scaling(2.0, 3.0));
        assert_eq!(font.scale_matrix(), Matrix::scaling(24.0, 36.0));
        assert_eq!(font.font_face().as_ptr(), face.as_ptr());
    }

    #[test]
    fn singular_font_matrix_fails() {
        let face = ToyFontFace::create("sans-serif", FontSlant::Normal, FontWeight::Normal);
        let font = ScaledFont::create(
            &face,
            &Matrix::scaling(0.0, 0.0),
            &Matrix::identity(),
            &FontOptions::new(),
        );
        assert_eq!(font.status(), Status::InvalidMatrix);
    }
}
