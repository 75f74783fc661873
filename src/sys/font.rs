// Boost/Apache2 License

//! Font options, font faces and scaled fonts.
//!
//! Only "toy" faces exist: a face is a family name plus slant and weight. There is no
//! glyph engine, so fonts are resources without rendering.

use core::cell::{Cell, RefCell};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::matrix::{matrix_is_invertible, matrix_multiply, RawMatrix};
use super::object::{self, Header, Object, Ref};
use super::{
    RawStatus, ANTIALIAS_BEST, ANTIALIAS_DEFAULT, FONT_SLANT_NORMAL, FONT_SLANT_OBLIQUE,
    FONT_TYPE_TOY, FONT_WEIGHT_BOLD, FONT_WEIGHT_NORMAL, HINT_METRICS_DEFAULT, HINT_METRICS_ON,
    HINT_STYLE_DEFAULT, HINT_STYLE_FULL, STATUS_INVALID_MATRIX, STATUS_INVALID_SLANT,
    STATUS_INVALID_WEIGHT, STATUS_NULL_POINTER, STATUS_SUCCESS, SUBPIXEL_ORDER_DEFAULT,
    SUBPIXEL_ORDER_VBGR,
};

/// Family used when no face has been selected.
pub(crate) const DEFAULT_FAMILY: &str = "sans-serif";

/// The values of a font options object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub(crate) struct FontOptionsData {
    pub(crate) antialias: i32,
    pub(crate) subpixel_order: i32,
    pub(crate) hint_style: i32,
    pub(crate) hint_metrics: i32,
    pub(crate) variations: Option<String>,
}

impl FontOptionsData {
    /// Overlay every non-default value of `other` onto `self`.
    pub(crate) fn merge(&mut self, other: &FontOptionsData) {
        if other.antialias != ANTIALIAS_DEFAULT {
            self.antialias = other.antialias;
        }
        if other.subpixel_order != SUBPIXEL_ORDER_DEFAULT {
            self.subpixel_order = other.subpixel_order;
        }
        if other.hint_style != HINT_STYLE_DEFAULT {
            self.hint_style = other.hint_style;
        }
        if other.hint_metrics != HINT_METRICS_DEFAULT {
            self.hint_metrics = other.hint_metrics;
        }

        if let Some(theirs) = &other.variations {
            self.variations = Some(match self.variations.take() {
                Some(ours) => format!("{},{}", ours, theirs),
                None => theirs.clone(),
            });
        }
    }

    fn hash_value(&self) -> u64 {
        let packed = (self.antialias as u64)
            | (self.subpixel_order as u64) << 4
            | (self.hint_style as u64) << 8
            | (self.hint_metrics as u64) << 16;

        let mut hasher = DefaultHasher::new();
        self.variations.hash(&mut hasher);
        packed ^ hasher.finish()
    }
}

/// A set of font rendering preferences. Deep-copied, never shared.
pub struct RawFontOptions {
    header: Header,
    status: Cell<RawStatus>,
    data: RefCell<FontOptionsData>,
}

impl Object for RawFontOptions {
    const KIND: &'static str = "font options";

    fn header(&self) -> &Header {
        &self.header
    }
}

impl RawFontOptions {
    pub(crate) fn data(&self) -> FontOptionsData {
        self.data.borrow().clone()
    }
}

pub(crate) fn font_options_create_from(data: FontOptionsData) -> *mut RawFontOptions {
    object::allocate(RawFontOptions {
        header: Header::new(),
        status: Cell::new(STATUS_SUCCESS),
        data: RefCell::new(data),
    })
}

pub fn font_options_create() -> *mut RawFontOptions {
    font_options_create_from(FontOptionsData::default())
}

/// Allocate an independent copy of `original`.
///
/// # Safety
///
/// `original` must be null or a live font options object.
pub unsafe fn font_options_copy(original: *const RawFontOptions) -> *mut RawFontOptions {
    match original.as_ref() {
        Some(original) => {
            let copy = font_options_create_from(original.data());
            if let Some(copy) = copy.as_ref() {
                copy.status.set(original.status.get());
            }
            copy
        }
        None => {
            let copy = font_options_create();
            if let Some(c) = copy.as_ref() {
                object::set_error(RawFontOptions::KIND, &c.status, STATUS_NULL_POINTER);
            }
            copy
        }
    }
}

/// # Safety
///
/// `options` must be null or a live font options object owned by the caller.
pub unsafe fn font_options_destroy(options: *mut RawFontOptions) {
    object::release(options)
}

/// # Safety
///
/// `options` must be null or a live font options object.
pub unsafe fn font_options_status(options: *const RawFontOptions) -> RawStatus {
    options
        .as_ref()
        .map_or(STATUS_NULL_POINTER, |o| o.status.get())
}

/// # Safety
///
/// Both arguments must be null or live font options objects.
pub unsafe fn font_options_merge(options: *mut RawFontOptions, other: *const RawFontOptions) {
    if let (Some(options), Some(other)) = (options.as_ref(), other.as_ref()) {
        if core::ptr::eq(options, other) {
            return;
        }
        let theirs = other.data();
        options.data.borrow_mut().merge(&theirs);
    }
}

/// # Safety
///
/// `options` must be null or a live font options object.
pub unsafe fn font_options_hash(options: *const RawFontOptions) -> u64 {
    options.as_ref().map_or(0, |o| o.data.borrow().hash_value())
}

/// # Safety
///
/// Both arguments must be null or live font options objects.
pub unsafe fn font_options_equal(
    options: *const RawFontOptions,
    other: *const RawFontOptions,
) -> bool {
    match (options.as_ref(), other.as_ref()) {
        (Some(a), Some(b)) => core::ptr::eq(a, b) || *a.data.borrow() == *b.data.borrow(),
        _ => false,
    }
}

macro_rules! option_accessors {
    ($($set: ident, $get: ident, $field: ident, $max: expr;)*) => {
        $(
            /// # Safety
            ///
            /// `options` must be null or a live font options object.
            pub unsafe fn $set(options: *mut RawFontOptions, value: i32) {
                if let Some(options) = options.as_ref() {
                    if (0..=$max).contains(&value) {
                        options.data.borrow_mut().$field = value;
                    }
                }
            }

            /// # Safety
            ///
            /// `options` must be null or a live font options object.
            pub unsafe fn $get(options: *const RawFontOptions) -> i32 {
                options.as_ref().map_or(0, |o| o.data.borrow().$field)
            }
        )*
    };
}

option_accessors! {
    font_options_set_antialias, font_options_get_antialias, antialias, ANTIALIAS_BEST;
    font_options_set_subpixel_order, font_options_get_subpixel_order, subpixel_order, SUBPIXEL_ORDER_VBGR;
    font_options_set_hint_style, font_options_get_hint_style, hint_style, HINT_STYLE_FULL;
    font_options_set_hint_metrics, font_options_get_hint_metrics, hint_metrics, HINT_METRICS_ON;
}

/// # Safety
///
/// `options` must be null or a live font options object.
pub unsafe fn font_options_set_variations(options: *mut RawFontOptions, variations: Option<&str>) {
    if let Some(options) = options.as_ref() {
        options.data.borrow_mut().variations = variations.map(str::to_owned);
    }
}

/// # Safety
///
/// `options` must be null or a live font options object.
pub unsafe fn font_options_get_variations(options: *const RawFontOptions) -> Option<String> {
    options
        .as_ref()
        .and_then(|o| o.data.borrow().variations.clone())
}

/// A font face.
pub struct RawFontFace {
    header: Header,
    status: Cell<RawStatus>,
    font_type: i32,
    family: String,
    slant: i32,
    weight: i32,
}

impl Object for RawFontFace {
    const KIND: &'static str = "font face";

    fn header(&self) -> &Header {
        &self.header
    }
}

impl RawFontFace {
    pub(crate) fn status(&self) -> RawStatus {
        self.status.get()
    }
}

pub(crate) fn font_face_create_in_error(status: RawStatus) -> *mut RawFontFace {
    let face = object::allocate(RawFontFace {
        header: Header::new(),
        status: Cell::new(STATUS_SUCCESS),
        font_type: FONT_TYPE_TOY,
        family: String::new(),
        slant: FONT_SLANT_NORMAL,
        weight: FONT_WEIGHT_NORMAL,
    });

    // SAFETY: freshly allocated.
    if let Some(f) = unsafe { face.as_ref() } {
        object::set_error(RawFontFace::KIND, &f.status, status);
    }
    face
}

/// Create a toy face from a family name, a slant and a weight.
pub fn toy_font_face_create(family: &str, slant: i32, weight: i32) -> *mut RawFontFace {
    if !(FONT_SLANT_NORMAL..=FONT_SLANT_OBLIQUE).contains(&slant) {
        return font_face_create_in_error(STATUS_INVALID_SLANT);
    }
    if !(FONT_WEIGHT_NORMAL..=FONT_WEIGHT_BOLD).contains(&weight) {
        return font_face_create_in_error(STATUS_INVALID_WEIGHT);
    }

    object::allocate(RawFontFace {
        header: Header::new(),
        status: Cell::new(STATUS_SUCCESS),
        font_type: FONT_TYPE_TOY,
        family: family.to_owned(),
        slant,
        weight,
    })
}

/// # Safety
///
/// `face` must be null or a live font face.
pub unsafe fn font_face_reference(face: *mut RawFontFace) -> *mut RawFontFace {
    object::reference(face)
}

/// # Safety
///
/// `face` must be null or a live font face, and the caller must own one count of it.
pub unsafe fn font_face_destroy(face: *mut RawFontFace) {
    object::release(face)
}

/// # Safety
///
/// `face` must be null or a live font face.
pub unsafe fn font_face_get_reference_count(face: *mut RawFontFace) -> u32 {
    object::reference_count(face)
}

/// # Safety
///
/// `face` must be null or a live font face.
pub unsafe fn font_face_status(face: *mut RawFontFace) -> RawStatus {
    face.as_ref().map_or(STATUS_NULL_POINTER, |f| f.status.get())
}

/// # Safety
///
/// `face` must be null or a live font face.
pub unsafe fn font_face_get_type(face: *mut RawFontFace) -> i32 {
    face.as_ref().map_or(FONT_TYPE_TOY, |f| f.font_type)
}

/// # Safety
///
/// `face` must be null or a live font face.
pub unsafe fn toy_font_face_get_family(face: *mut RawFontFace) -> String {
    face.as_ref().map_or_else(String::new, |f| f.family.clone())
}

/// # Safety
///
/// `face` must be null or a live font face.
pub unsafe fn toy_font_face_get_slant(face: *mut RawFontFace) -> i32 {
    face.as_ref().map_or(FONT_SLANT_NORMAL, |f| f.slant)
}

/// # Safety
///
/// `face` must be null or a live font face.
pub unsafe fn toy_font_face_get_weight(face: *mut RawFontFace) -> i32 {
    face.as_ref().map_or(FONT_WEIGHT_NORMAL, |f| f.weight)
}

/// A font face at a particular size and transform.
pub struct RawScaledFont {
    header: Header,
    status: Cell<RawStatus>,
    face: Ref<RawFontFace>,
    font_matrix: RawMatrix,
    ctm: RawMatrix,
    scale_matrix: RawMatrix,
    options: FontOptionsData,
}

impl Object for RawScaledFont {
    const KIND: &'static str = "scaled font";

    fn header(&self) -> &Header {
        &self.header
    }
}

impl RawScaledFont {
    pub(crate) fn status(&self) -> RawStatus {
        self.status.get()
    }

    pub(crate) fn face(&self) -> &Ref<RawFontFace> {
        &self.face
    }

    pub(crate) fn font_matrix(&self) -> RawMatrix {
        self.font_matrix
    }

    pub(crate) fn ctm(&self) -> RawMatrix {
        self.ctm
    }

    pub(crate) fn options(&self) -> &FontOptionsData {
        &self.options
    }
}

/// Create a scaled font. The translation part of `ctm` is ignored.
///
/// # Safety
///
/// `face` must be null or a live font face, and `options` null or a live font options
/// object.
pub unsafe fn scaled_font_create(
    face: *mut RawFontFace,
    font_matrix: &RawMatrix,
    ctm: &RawMatrix,
    options: *const RawFontOptions,
) -> *mut RawScaledFont {
    let (face, mut status) = match face.as_ref() {
        Some(face) => (Ref::share(face), face.status.get()),
        None => {
            let error = font_face_create_in_error(STATUS_NULL_POINTER);
            match Ref::adopt(error) {
                Some(face) => (face, STATUS_NULL_POINTER),
                None => abort!("font face allocation returned null"),
            }
        }
    };

    let options = match options.as_ref() {
        Some(options) => options.data(),
        None => {
            if status == STATUS_SUCCESS {
                status = STATUS_NULL_POINTER;
            }
            FontOptionsData::default()
        }
    };

    let mut ctm = *ctm;
    ctm.x0 = 0.0;
    ctm.y0 = 0.0;

    let scale_matrix = matrix_multiply(font_matrix, &ctm);
    if status == STATUS_SUCCESS
        && (!matrix_is_invertible(font_matrix) || !matrix_is_invertible(&scale_matrix))
    {
        status = STATUS_INVALID_MATRIX;
    }

    let font = object::allocate(RawScaledFont {
        header: Header::new(),
        status: Cell::new(STATUS_SUCCESS),
        face,
        font_matrix: *font_matrix,
        ctm,
        scale_matrix,
        options,
    });

    if let Some(f) = font.as_ref() {
        object::set_error(RawScaledFont::KIND, &f.status, status);
    }
    font
}

/// # Safety
///
/// `font` must be null or a live scaled font.
pub unsafe fn scaled_font_reference(font: *mut RawScaledFont) -> *mut RawScaledFont {
    object::reference(font)
}

/// # Safety
///
/// `font` must be null or a live scaled font, and the caller must own one count of it.
pub unsafe fn scaled_font_destroy(font: *mut RawScaledFont) {
    object::release(font)
}

/// # Safety
///
/// `font` must be null or a live scaled font.
pub unsafe fn scaled_font_get_reference_count(font: *mut RawScaledFont) -> u32 {
    object::reference_count(font)
}

/// # Safety
///
/// `font` must be null or a live scaled font.
pub unsafe fn scaled_font_status(font: *mut RawScaledFont) -> RawStatus {
    font.as_ref().map_or(STATUS_NULL_POINTER, |f| f.status.get())
}

/// # Safety
///
/// `font` must be null or a live scaled font.
pub unsafe fn scaled_font_get_type(font: *mut RawScaledFont) -> i32 {
    font.as_ref().map_or(FONT_TYPE_TOY, |f| f.face.font_type)
}

/// The face of `font`. The returned address is borrowed from the font.
///
/// # Safety
///
/// `font` must be null or a live scaled font.
pub unsafe fn scaled_font_get_font_face(font: *mut RawScaledFont) -> *mut RawFontFace {
    font.as_ref()
        .map_or(core::ptr::null_mut(), |f| f.face.as_ptr())
}

/// # Safety
///
/// `font` must be null or a live scaled font.
pub unsafe fn scaled_font_get_font_matrix(font: *mut RawScaledFont) -> RawMatrix {
    font.as_ref().map(|f| f.font_matrix).unwrap_or_default()
}

/// # Safety
///
/// `font` must be null or a live scaled font.
pub unsafe fn scaled_font_get_ctm(font: *mut RawScaledFont) -> RawMatrix {
    font.as_ref().map(|f| f.ctm).unwrap_or_default()
}

/// # Safety
///
/// `font` must be null or a live scaled font.
pub unsafe fn scaled_font_get_scale_matrix(font: *mut RawScaledFont) -> RawMatrix {
    font.as_ref().map(|f| f.scale_matrix).unwrap_or_default()
}

/// Copy the options of `font` into `options`.
///
/// # Safety
///
/// `font` must be null or a live scaled font, and `options` null or a live font options
/// object.
pub unsafe fn scaled_font_get_font_options(font: *mut RawScaledFont, options: *mut RawFontOptions) {
    if let (Some(font), Some(options)) = (font.as_ref(), options.as_ref()) {
        *options.data.borrow_mut() = font.options.clone();
    }
}

/// Overwrite the values of `options`.
pub(crate) fn font_options_assign(options: &RawFontOptions, data: FontOptionsData) {
    *options.data.borrow_mut() = data;
}

#[cfg(test)]
mod tests {
    use super::super::matrix::{matrix_init_identity, matrix_init_scale};
    use super::super::{ANTIALIAS_GRAY, HINT_STYLE_SLIGHT};
    use super::*;

    #[test]
    fn copies_are_independent() {
        let a = font_options_create();
        unsafe {
            font_options_set_antialias(a, ANTIALIAS_GRAY);
            let b = font_options_copy(a);
            assert!(font_options_equal(a, b));
            assert_eq!(font_options_hash(a), font_options_hash(b));

            font_options_set_hint_style(b, HINT_STYLE_SLIGHT);
            assert!(!font_options_equal(a, b));
            assert_eq!(font_options_get_hint_style(a), HINT_STYLE_DEFAULT);

            font_options_destroy(a);
            font_options_destroy(b);
        }
    }

    #[test]
    fn merge_keeps_defaults_and_joins_variations() {
        let mut ours = FontOptionsData {
            antialias: ANTIALIAS_GRAY,
            variations: Some("wght=400".into()),
            ..FontOptionsData::default()
        };
        let theirs = FontOptionsData {
            hint_style: HINT_STYLE_SLIGHT,
            variations: Some("wdth=80".into()),
            ..FontOptionsData::default()
        };

        ours.merge(&theirs);
        assert_eq!(ours.antialias, ANTIALIAS_GRAY);
        assert_eq!(ours.hint_style, HINT_STYLE_SLIGHT);
        assert_eq!(ours.variations.as_deref(), Some("wght=400,wdth=80"));
    }

    #[test]
    fn toy_faces_validate_their_arguments() {
        unsafe {
            let face = toy_font_face_create("serif", 7, FONT_WEIGHT_NORMAL);
            assert_eq!(font_face_status(face), STATUS_INVALID_SLANT);
            font_face_destroy(face);

            let face = toy_font_face_create("serif", FONT_SLANT_NORMAL, -1);
            assert_eq!(font_face_status(face), STATUS_INVALID_WEIGHT);
            font_face_destroy(face);

            // The slant is checked first.
            let face = toy_font_face_create("x", 9, 0);
            assert_eq!(font_face_status(face), STATUS_INVALID_SLANT);
            assert_eq!(font_face_get_type(face), FONT_TYPE_TOY);
            font_face_destroy(face);
        }
    }

    #[test]
    fn scaled_font_combines_matrices() {
        unsafe {
            let face = toy_font_face_create("serif", FONT_SLANT_NORMAL, FONT_WEIGHT_BOLD);
            let options = font_options_create();
            let mut ctm = matrix_init_scale(2.0, 2.0);
            ctm.x0 = 50.0;

            let font = scaled_font_create(face, &matrix_init_scale(10.0, 10.0), &ctm, options);
            assert_eq!(scaled_font_status(font), STATUS_SUCCESS);
            assert_eq!(font_face_get_reference_count(face), 2);
            assert_eq!(scaled_font_get_scale_matrix(font), matrix_init_scale(20.0, 20.0));
            assert_eq!(scaled_font_get_ctm(font).x0, 0.0);

            let singular = scaled_font_create(
                face,
                &matrix_init_scale(0.0, 10.0),
                &matrix_init_identity(),
                options,
            );
            assert_eq!(scaled_font_status(singular), STATUS_INVALID_MATRIX);

            scaled_font_destroy(singular);
            scaled_font_destroy(font);
            font_options_destroy(options);
            assert_eq!(font_face_get_reference_count(face), 1);
            font_face_destroy(face);
        }
    }
}
