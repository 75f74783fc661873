// Boost/Apache2 License

//! The drawing context.

use crate::font::{FontFace, FontOptions, FontSlant, FontWeight, ScaledFont};
use crate::geometry::{Color, Matrix, Rect, Vec2};
use crate::handle::SharedHandle;
use crate::path::Path;
use crate::pattern::Pattern;
use crate::status::Status;
use crate::surface::{Content, Surface};
use crate::sys;
use crate::Error;

raw_enum! {
    /// How drawing combines with what is already on the target.
    pub enum Operator {
        Clear = sys::OPERATOR_CLEAR,
        Source = sys::OPERATOR_SOURCE,
        Over = sys::OPERATOR_OVER,
        In = sys::OPERATOR_IN,
        Out = sys::OPERATOR_OUT,
        Atop = sys::OPERATOR_ATOP,
        Dest = sys::OPERATOR_DEST,
        DestOver = sys::OPERATOR_DEST_OVER,
        DestIn = sys::OPERATOR_DEST_IN,
        DestOut = sys::OPERATOR_DEST_OUT,
        DestAtop = sys::OPERATOR_DEST_ATOP,
        Xor = sys::OPERATOR_XOR,
        Add = sys::OPERATOR_ADD,
        Saturate = sys::OPERATOR_SATURATE,
        Multiply = sys::OPERATOR_MULTIPLY,
        Screen = sys::OPERATOR_SCREEN,
        Overlay = sys::OPERATOR_OVERLAY,
        Darken = sys::OPERATOR_DARKEN,
        Lighten = sys::OPERATOR_LIGHTEN,
        ColorDodge = sys::OPERATOR_COLOR_DODGE,
        ColorBurn = sys::OPERATOR_COLOR_BURN,
        HardLight = sys::OPERATOR_HARD_LIGHT,
        SoftLight = sys::OPERATOR_SOFT_LIGHT,
        Difference = sys::OPERATOR_DIFFERENCE,
        Exclusion = sys::OPERATOR_EXCLUSION,
        HslHue = sys::OPERATOR_HSL_HUE,
        HslSaturation = sys::OPERATOR_HSL_SATURATION,
        HslColor = sys::OPERATOR_HSL_COLOR,
        HslLuminosity = sys::OPERATOR_HSL_LUMINOSITY,
    }
}

raw_enum! {
    /// Antialiasing for drawing and, through [`FontOptions`], for text.
    pub enum Antialias {
        Default = sys::ANTIALIAS_DEFAULT,
        None = sys::ANTIALIAS_NONE,
        Gray = sys::ANTIALIAS_GRAY,
        Subpixel = sys::ANTIALIAS_SUBPIXEL,
        Fast = sys::ANTIALIAS_FAST,
        Good = sys::ANTIALIAS_GOOD,
        Best = sys::ANTIALIAS_BEST,
    }
}

raw_enum! {
    /// How the inside of a path is decided when filling.
    pub enum FillRule {
        Winding = sys::FILL_RULE_WINDING,
        EvenOdd = sys::FILL_RULE_EVEN_ODD,
    }
}

raw_enum! {
    /// How the ends of open subpaths are drawn.
    pub enum LineCap {
        Butt = sys::LINE_CAP_BUTT,
        Round = sys::LINE_CAP_ROUND,
        Square = sys::LINE_CAP_SQUARE,
    }
}

raw_enum! {
    /// How stroked segments meet at corners.
    pub enum LineJoin {
        Miter = sys::LINE_JOIN_MITER,
        Round = sys::LINE_JOIN_ROUND,
        Bevel = sys::LINE_JOIN_BEVEL,
    }
}

/// Draws onto a surface.
///
/// A context holds a stack of graphics states (source, transform, clip, line and font
/// settings) and a current path. Failures put it into a sticky error status, after
/// which every drawing call is ignored; check [`Context::status`] when done.
#[derive(Debug, Clone, Default)]
pub struct Context {
    handle: SharedHandle<sys::RawContext>,
}

impl Context {
    /// Create a context that draws on `target`.
    pub fn create(target: &Surface) -> Self {
        unsafe { Self::from_raw(sys::context_create(target.as_ptr())) }
    }

    /// Wrap an owned context.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a live context whose count the caller owns.
    pub unsafe fn from_raw(ptr: *mut sys::RawContext) -> Self {
        Self {
            handle: SharedHandle::from_raw(ptr),
        }
    }

    /// Wrap a borrowed context, adding a reference.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a live context.
    pub unsafe fn from_raw_shared(ptr: *mut sys::RawContext) -> Self {
        Self {
            handle: SharedHandle::from_raw_shared(ptr),
        }
    }

    /// The underlying context pointer, without a new reference.
    pub fn as_ptr(&self) -> *mut sys::RawContext {
        self.handle.as_ptr()
    }

    /// The sticky error status of the context.
    pub fn status(&self) -> Status {
        Status::from_raw(unsafe { sys::context_status(self.as_ptr()) })
    }

    /// Number of live references to the context.
    pub fn reference_count(&self) -> u32 {
        self.handle.reference_count()
    }

    /// The surface the context was created for.
    pub fn target(&self) -> Surface {
        unsafe { Surface::from_raw_shared(sys::context_get_target(self.as_ptr())) }
    }

    /// The surface drawing currently goes to: the innermost group, or the target.
    pub fn group_target(&self) -> Surface {
        unsafe { Surface::from_raw_shared(sys::context_get_group_target(self.as_ptr())) }
    }

    /// Push a copy of the graphics state. See also [`StateGuard`](crate::StateGuard).
    pub fn save(&self) {
        unsafe { sys::context_save(self.as_ptr()) }
    }

    /// Pop the graphics state. Without a matching save, the context fails with
    /// [`Status::InvalidRestore`].
    pub fn restore(&self) {
        unsafe { sys::context_restore(self.as_ptr()) }
    }

    /// Redirect drawing to a new transparent group, saving the state.
    pub fn push_group(&self) {
        unsafe { sys::context_push_group(self.as_ptr()) }
    }

    /// Like [`push_group`](Self::push_group), with an explicit content.
    pub fn push_group_with_content(&self, content: Content) {
        unsafe { sys::context_push_group_with_content(self.as_ptr(), content.bits()) }
    }

    /// End the innermost group and return what was drawn into it.
    pub fn pop_group(&self) -> Pattern {
        unsafe { Pattern::from_raw(sys::context_pop_group(self.as_ptr())) }
    }

    /// End the innermost group and use it as the source.
    pub fn pop_group_to_source(&self) {
        unsafe { sys::context_pop_group_to_source(self.as_ptr()) }
    }

    /// Set the compositing operator.
    pub fn set_operator(&self, op: Operator) {
        unsafe { sys::context_set_operator(self.as_ptr(), op.into_raw()) }
    }

    /// The current compositing operator.
    pub fn operator(&self) -> Operator {
        let raw = unsafe { sys::context_get_operator(self.as_ptr()) };
        Operator::from_raw(raw).unwrap_or(Operator::Over)
    }

    /// Use `source` for subsequent drawing.
    pub fn set_source(&self, source: &Pattern) {
        unsafe { sys::context_set_source(self.as_ptr(), source.as_ptr()) }
    }

    /// Use an opaque color for subsequent drawing.
    pub fn set_source_rgb(&self, red: f64, green: f64, blue: f64) {
        unsafe { sys::context_set_source_rgb(self.as_ptr(), red, green, blue) }
    }

    /// Use a translucent color for subsequent drawing.
    pub fn set_source_rgba(&self, red: f64, green: f64, blue: f64, alpha: f64) {
        unsafe { sys::context_set_source_rgba(self.as_ptr(), red, green, blue, alpha) }
    }

    /// Use `color` for subsequent drawing.
    pub fn set_source_color(&self, color: Color) {
        self.set_source_rgba(color.red, color.green, color.blue, color.alpha)
    }

    /// Use `surface` as the source, with its origin at `(x, y)` in user space.
    pub fn set_source_surface(&self, surface: &Surface, x: f64, y: f64) {
        unsafe { sys::context_set_source_surface(self.as_ptr(), surface.as_ptr(), x, y) }
    }

    /// Point form of [`set_source_surface`](Self::set_source_surface).
    pub fn set_source_surface_point(&self, surface: &Surface, origin: Vec2<f64>) {
        self.set_source_surface(surface, origin.x, origin.y)
    }

    /// The current source pattern.
    pub fn source(&self) -> Pattern {
        unsafe { Pattern::from_raw_shared(sys::context_get_source(self.as_ptr())) }
    }

    /// Set the flattening tolerance in device pixels. Values below 1/256 are raised to it.
    pub fn set_tolerance(&self, tolerance: f64) {
        unsafe { sys::context_set_tolerance(self.as_ptr(), tolerance) }
    }

    /// The curve flattening tolerance, in device pixels.
    pub fn tolerance(&self) -> f64 {
        unsafe { sys::context_get_tolerance(self.as_ptr()) }
    }

    /// Set the antialiasing mode for shapes.
    pub fn set_antialias(&self, antialias: Antialias) {
        unsafe { sys::context_set_antialias(self.as_ptr(), antialias.into_raw()) }
    }

    /// The antialiasing mode for shapes.
    pub fn antialias(&self) -> Antialias {
        let raw = unsafe { sys::context_get_antialias(self.as_ptr()) };
        Antialias::from_raw(raw).unwrap_or(Antialias::Default)
    }

    /// Set how the interior of a path is decided.
    pub fn set_fill_rule(&self, rule: FillRule) {
        unsafe { sys::context_set_fill_rule(self.as_ptr(), rule.into_raw()) }
    }

    /// The current fill rule.
    pub fn fill_rule(&self) -> FillRule {
        let raw = unsafe { sys::context_get_fill_rule(self.as_ptr()) };
        FillRule::from_raw(raw).unwrap_or(FillRule::Winding)
    }

    /// Set the line width in user space. Negative widths become zero.
    pub fn set_line_width(&self, width: f64) {
        unsafe { sys::context_set_line_width(self.as_ptr(), width) }
    }

    /// The current stroke width, in user units.
    pub fn line_width(&self) -> f64 {
        unsafe { sys::context_get_line_width(self.as_ptr()) }
    }

    /// Set how open subpaths end when stroked.
    pub fn set_line_cap(&self, cap: LineCap) {
        unsafe { sys::context_set_line_cap(self.as_ptr(), cap.into_raw()) }
    }

    /// The current line cap.
    pub fn line_cap(&self) -> LineCap {
        let raw = unsafe { sys::context_get_line_cap(self.as_ptr()) };
        LineCap::from_raw(raw).unwrap_or(LineCap::Butt)
    }

    /// Set how stroked segments meet.
    pub fn set_line_join(&self, join: LineJoin) {
        unsafe { sys::context_set_line_join(self.as_ptr(), join.into_raw()) }
    }

    /// The current line join.
    pub fn line_join(&self) -> LineJoin {
        let raw = unsafe { sys::context_get_line_join(self.as_ptr()) };
        LineJoin::from_raw(raw).unwrap_or(LineJoin::Miter)
    }

    /// Set the dash pattern, alternating on and off lengths in user space. An empty
    /// slice turns dashing off. Negative lengths, or only zeros, fail with
    /// [`Status::InvalidDash`].
    pub fn set_dash(&self, dashes: &[f64], offset: f64) {
        unsafe { sys::context_set_dash(self.as_ptr(), dashes, offset) }
    }

    /// Number of entries in the dash pattern.
    pub fn dash_count(&self) -> usize {
        unsafe { sys::context_get_dash_count(self.as_ptr()) }.max(0) as usize
    }

    /// The dash lengths and offset.
    pub fn dash(&self) -> (Vec<f64>, f64) {
        let mut dashes = Vec::new();
        let mut offset = 0.0;
        unsafe { sys::context_get_dash(self.as_ptr(), &mut dashes, &mut offset) };
        (dashes, offset)
    }

    /// Set the ratio above which miter joins are beveled.
    pub fn set_miter_limit(&self, limit: f64) {
        unsafe { sys::context_set_miter_limit(self.as_ptr(), limit) }
    }

    /// The current miter limit.
    pub fn miter_limit(&self) -> f64 {
        unsafe { sys::context_get_miter_limit(self.as_ptr()) }
    }

    /// Move the user-space origin.
    pub fn translate(&self, tx: f64, ty: f64) -> &Self {
        unsafe { sys::context_translate(self.as_ptr(), tx, ty) };
        self
    }

    /// Scale the user-space axes.
    pub fn scale(&self, sx: f64, sy: f64) -> &Self {
        unsafe { sys::context_scale(self.as_ptr(), sx, sy) };
        self
    }

    /// Rotate the user-space axes.
    pub fn rotate(&self, radians: f64) -> &Self {
        unsafe { sys::context_rotate(self.as_ptr(), radians) };
        self
    }

    /// Apply `matrix` before the current transform.
    pub fn transform(&self, matrix: &Matrix) -> &Self {
        let raw = sys::RawMatrix::from(*matrix);
        unsafe { sys::context_transform(self.as_ptr(), &raw) };
        self
    }

    /// Replace the transform. A singular matrix fails with [`Status::InvalidMatrix`].
    pub fn set_matrix(&self, matrix: &Matrix) -> &Self {
        let raw = sys::RawMatrix::from(*matrix);
        unsafe { sys::context_set_matrix(self.as_ptr(), &raw) };
        self
    }

    /// The current transformation matrix.
    pub fn matrix(&self) -> Matrix {
        unsafe { sys::context_get_matrix(self.as_ptr()) }.into()
    }

    /// Reset the transform to the identity.
    pub fn identity_matrix(&self) -> &Self {
        unsafe { sys::context_identity_matrix(self.as_ptr()) };
        self
    }

    /// Map a point from user space to device space.
    pub fn user_to_device(&self, point: Vec2<f64>) -> Vec2<f64> {
        unsafe { sys::context_user_to_device(self.as_ptr(), point.into()) }.into()
    }

    /// Map a distance from user space to device space, ignoring translation.
    pub fn user_to_device_distance(&self, distance: Vec2<f64>) -> Vec2<f64> {
        unsafe { sys::context_user_to_device_distance(self.as_ptr(), distance.into()) }.into()
    }

    /// Map a point from device space to user space.
    pub fn device_to_user(&self, point: Vec2<f64>) -> Vec2<f64> {
        unsafe { sys::context_device_to_user(self.as_ptr(), point.into()) }.into()
    }

    /// Map a distance from device space to user space.
    pub fn device_to_user_distance(&self, distance: Vec2<f64>) -> Vec2<f64> {
        unsafe { sys::context_device_to_user_distance(self.as_ptr(), distance.into()) }.into()
    }

    /// Clear the current path.
    pub fn new_path(&self) -> &Self {
        unsafe { sys::context_new_path(self.as_ptr()) };
        self
    }

    /// Start a new subpath without a current point, so the next arc is not joined to
    /// the previous one.
    pub fn new_sub_path(&self) -> &Self {
        unsafe { sys::context_new_sub_path(self.as_ptr()) };
        self
    }

    /// Begin a new subpath at `(x, y)`.
    pub fn move_to(&self, x: f64, y: f64) -> &Self {
        unsafe { sys::context_move_to(self.as_ptr(), x, y) };
        self
    }

    /// Point form of [`move_to`](Self::move_to).
    pub fn move_to_point(&self, point: Vec2<f64>) -> &Self {
        self.move_to(point.x, point.y)
    }

    /// Add a line. Without a current point this acts as [`Context::move_to`].
    pub fn line_to(&self, x: f64, y: f64) -> &Self {
        unsafe { sys::context_line_to(self.as_ptr(), x, y) };
        self
    }

    /// Point form of [`line_to`](Self::line_to).
    pub fn line_to_point(&self, point: Vec2<f64>) -> &Self {
        self.line_to(point.x, point.y)
    }

    /// Add a cubic Bézier spline ending at `(x3, y3)`.
    pub fn curve_to(&self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) -> &Self {
        unsafe { sys::context_curve_to(self.as_ptr(), x1, y1, x2, y2, x3, y3) };
        self
    }

    /// Point form of [`curve_to`](Self::curve_to).
    pub fn curve_to_point(&self, p1: Vec2<f64>, p2: Vec2<f64>, p3: Vec2<f64>) -> &Self {
        self.curve_to(p1.x, p1.y, p2.x, p2.y, p3.x, p3.y)
    }

    /// Add an arc in the direction of increasing angle, joined to the current point by
    /// a line.
    pub fn arc(&self, xc: f64, yc: f64, radius: f64, angle1: f64, angle2: f64) -> &Self {
        unsafe { sys::context_arc(self.as_ptr(), xc, yc, radius, angle1, angle2) };
        self
    }

    /// Point form of [`arc`](Self::arc).
    pub fn arc_point(&self, center: Vec2<f64>, radius: f64, angle1: f64, angle2: f64) -> &Self {
        self.arc(center.x, center.y, radius, angle1, angle2)
    }

    /// Add an arc in the direction of decreasing angle.
    pub fn arc_negative(&self, xc: f64, yc: f64, radius: f64, angle1: f64, angle2: f64) -> &Self {
        unsafe { sys::context_arc_negative(self.as_ptr(), xc, yc, radius, angle1, angle2) };
        self
    }

    /// Point form of [`arc_negative`](Self::arc_negative).
    pub fn arc_negative_point(
        &self,
        center: Vec2<f64>,
        radius: f64,
        angle1: f64,
        angle2: f64,
    ) -> &Self {
        self.arc_negative(center.x, center.y, radius, angle1, angle2)
    }

    /// Move relative to the current point. Without one, the context fails with
    /// [`Status::NoCurrentPoint`]; the same goes for the other `rel_` calls.
    pub fn rel_move_to(&self, dx: f64, dy: f64) -> &Self {
        unsafe { sys::context_rel_move_to(self.as_ptr(), dx, dy) };
        self
    }

    /// Add a line relative to the current point.
    pub fn rel_line_to(&self, dx: f64, dy: f64) -> &Self {
        unsafe { sys::context_rel_line_to(self.as_ptr(), dx, dy) };
        self
    }

    /// Add a spline with control points relative to the current point.
    pub fn rel_curve_to(
        &self,
        dx1: f64,
        dy1: f64,
        dx2: f64,
        dy2: f64,
        dx3: f64,
        dy3: f64,
    ) -> &Self {
        unsafe { sys::context_rel_curve_to(self.as_ptr(), dx1, dy1, dx2, dy2, dx3, dy3) };
        self
    }

    /// Add a closed rectangle subpath.
    pub fn rectangle(&self, x: f64, y: f64, width: f64, height: f64) -> &Self {
        unsafe { sys::context_rectangle(self.as_ptr(), x, y, width, height) };
        self
    }

    /// Add `rect` as a closed subpath.
    pub fn rectangle_rect(&self, rect: Rect<f64>) -> &Self {
        self.rectangle(rect.x, rect.y, rect.width, rect.height)
    }

    /// Close the current subpath with a line back to its start.
    pub fn close_path(&self) -> &Self {
        unsafe { sys::context_close_path(self.as_ptr()) };
        self
    }

    /// Whether the path has a current point.
    pub fn has_current_point(&self) -> bool {
        unsafe { sys::context_has_current_point(self.as_ptr()) }
    }

    /// The current point in user space. The origin when there is none.
    pub fn current_point(&self) -> Vec2<f64> {
        unsafe { sys::context_get_current_point(self.as_ptr()) }.into()
    }

    /// Bounds of the current path, ignoring line width and fill rule.
    pub fn path_extents(&self) -> Rect<f64> {
        unsafe { sys::context_path_extents(self.as_ptr()) }.into()
    }

    /// User-space bounds of the area a fill would cover.
    pub fn fill_extents(&self) -> Rect<f64> {
        unsafe { sys::context_fill_extents(self.as_ptr()) }.into()
    }

    /// Bounds of what [`Context::stroke`] would cover with the current line settings.
    pub fn stroke_extents(&self) -> Rect<f64> {
        unsafe { sys::context_stroke_extents(self.as_ptr()) }.into()
    }

    /// Copy the current path in user space.
    pub fn copy_path(&self) -> Path {
        unsafe { Path::from_raw(sys::context_copy_path(self.as_ptr())) }
    }

    /// Copy the current path with curves flattened to lines.
    pub fn copy_path_flat(&self) -> Path {
        unsafe { Path::from_raw(sys::context_copy_path_flat(self.as_ptr())) }
    }

    /// Append a path copied from any context, interpreted in the current user space.
    pub fn append_path(&self, path: &Path) -> &Self {
        unsafe { sys::context_append_path(self.as_ptr(), path.as_ptr()) };
        self
    }

    /// Paint the source everywhere inside the clip.
    pub fn paint(&self) {
        unsafe { sys::context_paint(self.as_ptr()) }
    }

    /// Paint the source everywhere within the clip, scaled by `alpha`.
    pub fn paint_with_alpha(&self, alpha: f64) {
        unsafe { sys::context_paint_with_alpha(self.as_ptr(), alpha) }
    }

    /// Paint the source through the alpha channel of `pattern`.
    pub fn mask(&self, pattern: &Pattern) {
        unsafe { sys::context_mask(self.as_ptr(), pattern.as_ptr()) }
    }

    /// Paint the source through the alpha of `surface` placed at `(x, y)`.
    pub fn mask_surface(&self, surface: &Surface, x: f64, y: f64) {
        unsafe { sys::context_mask_surface(self.as_ptr(), surface.as_ptr(), x, y) }
    }

    /// Point form of [`mask_surface`](Self::mask_surface).
    pub fn mask_surface_point(&self, surface: &Surface, origin: Vec2<f64>) {
        self.mask_surface(surface, origin.x, origin.y)
    }

    /// Stroke the current path, then clear it.
    pub fn stroke(&self) {
        unsafe { sys::context_stroke(self.as_ptr()) }
    }

    /// Stroke the path and keep it.
    pub fn stroke_preserve(&self) {
        unsafe { sys::context_stroke_preserve(self.as_ptr()) }
    }

    /// Fill the current path, then clear it.
    pub fn fill(&self) {
        unsafe { sys::context_fill(self.as_ptr()) }
    }

    /// Fill the path and keep it.
    pub fn fill_preserve(&self) {
        unsafe { sys::context_fill_preserve(self.as_ptr()) }
    }

    /// Whether a fill would cover the user-space point.
    pub fn in_fill(&self, x: f64, y: f64) -> bool {
        unsafe { sys::context_in_fill(self.as_ptr(), x, y) }
    }

    /// Point form of [`in_fill`](Self::in_fill).
    pub fn in_fill_point(&self, point: Vec2<f64>) -> bool {
        self.in_fill(point.x, point.y)
    }

    /// Whether a stroke would cover the user-space point.
    pub fn in_stroke(&self, x: f64, y: f64) -> bool {
        unsafe { sys::context_in_stroke(self.as_ptr(), x, y) }
    }

    /// Point form of [`in_stroke`](Self::in_stroke).
    pub fn in_stroke_point(&self, point: Vec2<f64>) -> bool {
        self.in_stroke(point.x, point.y)
    }

    /// Whether a user-space point lies inside the clip.
    pub fn in_clip(&self, x: f64, y: f64) -> bool {
        unsafe { sys::context_in_clip(self.as_ptr(), x, y) }
    }

    /// Point form of [`in_clip`](Self::in_clip).
    pub fn in_clip_point(&self, point: Vec2<f64>) -> bool {
        self.in_clip(point.x, point.y)
    }

    /// Drop the clip region.
    pub fn reset_clip(&self) {
        unsafe { sys::context_reset_clip(self.as_ptr()) }
    }

    /// Intersect the clip with the current path, then clear the path.
    pub fn clip(&self) {
        unsafe { sys::context_clip(self.as_ptr()) }
    }

    /// Intersect the clip with the path and keep the path.
    pub fn clip_preserve(&self) {
        unsafe { sys::context_clip_preserve(self.as_ptr()) }
    }

    /// Bounds of the clip in user space.
    pub fn clip_extents(&self) -> Rect<f64> {
        unsafe { sys::context_clip_extents(self.as_ptr()) }.into()
    }

    /// The clip as user-space rectangles. Fails with [`Status::ClipNotRepresentable`]
    /// when the clip is not a union of axis-aligned rectangles.
    pub fn clip_rectangle_list(&self) -> Result<Vec<Rect<f64>>, Error> {
        let mut rectangles = Vec::new();
        Error::check(
            unsafe { sys::context_copy_clip_rectangle_list(self.as_ptr(), &mut rectangles) },
            "context_copy_clip_rectangle_list",
        )?;
        Ok(rectangles.into_iter().map(Rect::from).collect())
    }

    /// Select a face from the built-in toy font family `family`.
    pub fn select_font_face(&self, family: &str, slant: FontSlant, weight: FontWeight) {
        unsafe {
            sys::context_select_font_face(
                self.as_ptr(),
                family,
                slant.into_raw(),
                weight.into_raw(),
            )
        }
    }

    /// Set the font matrix to a uniform scale of `size`.
    pub fn set_font_size(&self, size: f64) {
        unsafe { sys::context_set_font_size(self.as_ptr(), size) }
    }

    /// Set the font-space to user-space transform.
    pub fn set_font_matrix(&self, matrix: &Matrix) {
        let raw = sys::RawMatrix::from(*matrix);
        unsafe { sys::context_set_font_matrix(self.as_ptr(), &raw) }
    }

    /// The current font matrix.
    pub fn font_matrix(&self) -> Matrix {
        unsafe { sys::context_get_font_matrix(self.as_ptr()) }.into()
    }

    /// Replace the context's font options with a copy of `options`.
    pub fn set_font_options(&self, options: &FontOptions) {
        unsafe { sys::context_set_font_options(self.as_ptr(), options.as_ptr()) }
    }

    /// A copy of the font options set on the context.
    pub fn font_options(&self) -> FontOptions {
        let options = FontOptions::new();
        unsafe { sys::context_get_font_options(self.as_ptr(), options.as_ptr()) };
        options
    }

    /// Set the font face. An empty face restores the default one.
    pub fn set_font_face(&self, face: &FontFace) {
        unsafe { sys::context_set_font_face(self.as_ptr(), face.as_ptr()) }
    }

    /// The current font face.
    pub fn font_face(&self) -> FontFace {
        unsafe { FontFace::from_raw_shared(sys::context_get_font_face(self.as_ptr())) }
    }

    /// Set the face, font matrix and font options at once from `font`.
    pub fn set_scaled_font(&self, font: &ScaledFont) {
        unsafe { sys::context_set_scaled_font(self.as_ptr(), font.as_ptr()) }
    }

    /// The font selected by the current face, font matrix, transform and options.
    pub fn scaled_font(&self) -> ScaledFont {
        unsafe { ScaledFont::from_raw_shared(sys::context_get_scaled_font(self.as_ptr())) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::SolidPattern;
    use crate::{Format, ImageSurface};
    use approx::assert_abs_diff_eq;
    use core::convert::TryFrom;

    fn context(width: i32, height: i32) -> (ImageSurface, Context) {
        let surface = ImageSurface::create(Format::Argb32, width, height);
        let cr = Context::create(&surface);
        (surface, cr)
    }

    #[test]
    fn solid_fill_covers_every_pixel() {
        let (surface, cr) = context(512, 512);
        cr.set_source_rgb(0.25, 0.5, 1.0);
        cr.rectangle(0.0, 0.0, 512.0, 512.0).fill();
        assert_eq!(cr.status(), Status::Success);
        assert_eq!(surface.status(), Status::Success);

        let data = surface.data().unwrap();
        assert_eq!(data.len(), surface.stride() as usize * 512);
        for pixel in data.chunks_exact(4) {
            assert_abs_diff_eq!(f64::from(pixel[0]) / 255.0, 0.25, epsilon = 0.01);
            assert_abs_diff_eq!(f64::from(pixel[1]) / 255.0, 0.5, epsilon = 0.01);
            assert_eq!(pixel[2], 255);
            assert_eq!(pixel[3], 255);
        }
    }

    #[test]
    fn rectangle_clip_extents() {
        let (_surface, cr) = context(100, 100);
        cr.rectangle(10.0, 20.0, 30.0, 40.0);
        cr.clip();
        assert!(!cr.has_current_point());
        assert_eq!(cr.clip_extents(), Rect::new(10.0, 20.0, 30.0, 40.0));
        assert_eq!(
            cr.clip_rectangle_list().unwrap(),
            vec![Rect::new(10.0, 20.0, 30.0, 40.0)]
        );

        cr.reset_clip();
        assert_eq!(cr.clip_extents(), Rect::new(0.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn rotated_clips_have_no_rectangle_list() {
        let (_surface, cr) = context(100, 100);
        cr.rotate(0.5);
        let err = cr.clip_rectangle_list().unwrap_err();
        assert_eq!(err.status(), Status::ClipNotRepresentable);
        assert_eq!(cr.status(), Status::Success);
    }

    #[test]
    fn unbalanced_restore_is_sticky() {
        let (_surface, cr) = context(4, 4);
        cr.save();
        cr.restore();
        assert_eq!(cr.status(), Status::Success);

        cr.restore();
        assert_eq!(cr.status(), Status::InvalidRestore);
        cr.save();
        assert_eq!(cr.status(), Status::InvalidRestore);
    }

    #[test]
    fn relative_moves_need_a_current_point() {
        let (_surface, cr) = context(4, 4);
        cr.rel_line_to(1.0, 1.0);
        assert_eq!(cr.status(), Status::NoCurrentPoint);
    }

    #[test]
    fn transforms_chain_and_convert_points() {
        let (_surface, cr) = context(4, 4);
        cr.translate(10.0, 0.0).scale(2.0, 3.0);
        assert_eq!(cr.user_to_device(Vec2::new(1.0, 1.0)), Vec2::new(12.0, 3.0));
        assert_eq!(cr.device_to_user(Vec2::new(12.0, 3.0)), Vec2::new(1.0, 1.0));
        assert_eq!(
            cr.user_to_device_distance(Vec2::new(1.0, 1.0)),
            Vec2::new(2.0, 3.0)
        );

        cr.move_to(1.0, 2.0);
        assert_eq!(cr.current_point(), Vec2::new(1.0, 2.0));

        cr.identity_matrix();
        assert_eq!(cr.matrix(), Matrix::identity());

        cr.set_matrix(&Matrix::scaling(0.0, 1.0));
        assert_eq!(cr.status(), Status::InvalidMatrix);
    }

    #[test]
    fn line_settings_round_trip() {
        let (_surface, cr) = context(4, 4);
        assert_eq!(cr.line_width(), 2.0);
        cr.set_line_width(-1.0);
        assert_eq!(cr.line_width(), 0.0);

        cr.set_line_cap(LineCap::Round);
        cr.set_line_join(LineJoin::Bevel);
        cr.set_fill_rule(FillRule::EvenOdd);
        cr.set_operator(Operator::Xor);
        assert_eq!(cr.line_cap(), LineCap::Round);
        assert_eq!(cr.line_join(), LineJoin::Bevel);
        assert_eq!(cr.fill_rule(), FillRule::EvenOdd);
        assert_eq!(cr.operator(), Operator::Xor);

        cr.set_dash(&[4.0, 2.0], 1.0);
        assert_eq!(cr.dash_count(), 2);
        assert_eq!(cr.dash(), (vec![4.0, 2.0], 1.0));

        cr.set_dash(&[-1.0], 0.0);
        assert_eq!(cr.status(), Status::InvalidDash);
    }

    #[test]
    fn source_is_shared() {
        let (_surface, cr) = context(4, 4);
        cr.set_source_color(Color::rgba(0.0, 1.0, 0.0, 0.5));

        let source = SolidPattern::try_from(cr.source()).unwrap();
        assert_eq!(source.color(), Color::rgba(0.0, 1.0, 0.0, 0.5));
        assert_eq!(source.reference_count(), 2);
    }

    #[test]
    fn groups_become_patterns() {
        let (surface, cr) = context(4, 4);
        cr.push_group();
        assert_ne!(cr.group_target().as_ptr(), surface.as_ptr());
        assert_eq!(cr.target().as_ptr(), surface.as_ptr());

        cr.set_source_rgb(0.0, 0.0, 1.0);
        cr.paint();
        let group = cr.pop_group();
        assert_eq!(group.status(), Status::Success);
        assert_eq!(group.pattern_type(), crate::PatternType::Surface);

        let err = cr.pop_group();
        assert_eq!(err.status(), Status::InvalidPopGroup);
        assert_eq!(cr.status(), Status::InvalidPopGroup);
    }

    #[test]
    fn hit_testing() {
        let (_surface, cr) = context(100, 100);
        cr.set_line_width(4.0);
        cr.rectangle_rect(Rect::new(10.0, 10.0, 20.0, 20.0));

        assert!(cr.in_fill(20.0, 20.0));
        assert!(!cr.in_fill(50.0, 50.0));
        assert!(cr.in_stroke_point(Vec2::new(10.0, 20.0)));
        assert!(!cr.in_stroke(20.0, 20.0));
        assert!(cr.in_clip(99.0, 99.0));
        assert_eq!(cr.path_extents(), Rect::new(10.0, 10.0, 20.0, 20.0));
    }

    #[test]
    fn fonts_follow_the_context() {
        let (_surface, cr) = context(4, 4);
        cr.select_font_face("serif", FontSlant::Italic, FontWeight::Bold);
        cr.set_font_size(12.0);

        let face = cr.font_face().into_toy().unwrap();
        assert_eq!(face.family(), "serif");
        assert_eq!(face.slant(), FontSlant::Italic);
        assert_eq!(cr.font_matrix(), Matrix::scaling(12.0, 12.0));

        let font = cr.scaled_font();
        assert_eq!(font.status(), Status::Success);
        assert_eq!(font.font_face().as_ptr(), cr.font_face().as_ptr());

        let mut options = FontOptions::new();
        options.set_antialias(Antialias::None);
        cr.set_font_options(&options);
        assert_eq!(cr.font_options().antialias(), Antialias::None);
    }

    #[test]
    fn shared_contexts_count_references() {
        let (_surface, cr) = context(4, 4);
        let other = cr.clone();
        assert_eq!(cr.reference_count(), 2);
        drop(other);
        assert_eq!(cr.reference_count(), 1);
    }
}
