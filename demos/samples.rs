// Boost/Apache2 License

//! Draws the classic sample images and writes them out as PNG files.
//!
//! Usage: `cargo run --example samples [OUTPUT_DIR] [IMAGE.png]`. Without an image, a
//! generated landscape is written to the output directory and loaded back from there.
//! Set `RUST_LOG=debug` to see the library report objects entering an error status.

use std::error::Error;
use std::f64::consts::{PI, SQRT_2};
use std::path::{Path, PathBuf};

use vellum::{
    Color, Context, Extend, FillRule, Format, ImageSurface, LineCap, LineJoin,
    LinearGradient, Matrix, RadialGradient, Rect, StateGuard, Status, SurfacePattern, Vec2,
};

const SIZE: i32 = 512;

/// Inputs shared by the samples.
struct Assets {
    image: ImageSurface,
}

type Sample = fn(&Context, &Assets);

fn arc(cr: &Context, _: &Assets) {
    let (xc, yc, radius) = (128.0, 128.0, 100.0);
    let (angle1, angle2) = (45.0 * PI / 180.0, 180.0 * PI / 180.0);

    cr.set_line_width(10.0);
    cr.arc(xc, yc, radius, angle1, angle2);
    cr.stroke();

    helping_lines(cr, xc, yc, radius, angle1, angle2);
}

fn arc_negative(cr: &Context, _: &Assets) {
    let (xc, yc, radius) = (128.0, 128.0, 100.0);
    let (angle1, angle2) = (45.0 * PI / 180.0, 180.0 * PI / 180.0);

    cr.set_line_width(10.0);
    cr.arc_negative(xc, yc, radius, angle1, angle2);
    cr.stroke();

    helping_lines(cr, xc, yc, radius, angle1, angle2);
}

/// Mark the center of an arc and the radii to its ends.
fn helping_lines(cr: &Context, xc: f64, yc: f64, radius: f64, angle1: f64, angle2: f64) {
    cr.set_source_rgba(1.0, 0.2, 0.2, 0.6);
    cr.set_line_width(6.0);

    cr.arc(xc, yc, 10.0, 0.0, 2.0 * PI);
    cr.fill();

    cr.arc(xc, yc, radius, angle1, angle1)
        .line_to(xc, yc)
        .arc(xc, yc, radius, angle2, angle2)
        .line_to(xc, yc);
    cr.stroke();
}

fn clip(cr: &Context, _: &Assets) {
    cr.arc(128.0, 128.0, 76.8, 0.0, 2.0 * PI);
    cr.clip();

    cr.new_path();
    cr.rectangle(0.0, 0.0, 256.0, 256.0).fill();
    cr.set_source_rgb(0.0, 1.0, 0.0);
    cr.move_to(0.0, 0.0)
        .line_to(256.0, 256.0)
        .move_to(256.0, 0.0)
        .line_to(0.0, 256.0);
    cr.set_line_width(10.0);
    cr.stroke();
}

fn clip_image(cr: &Context, assets: &Assets) {
    cr.arc(128.0, 128.0, 76.8, 0.0, 2.0 * PI);
    cr.clip();
    cr.new_path();

    let size = assets.image.size();
    cr.scale(256.0 / f64::from(size.x), 256.0 / f64::from(size.y));
    cr.set_source_surface(&assets.image, 0.0, 0.0);
    cr.paint();
}

fn curve_rectangle(cr: &Context, _: &Assets) {
    let (x0, y0) = (25.6, 25.6);
    let (width, height) = (204.8, 204.8);
    let radius = 102.4;
    let (x1, y1) = (x0 + width, y0 + height);

    match (width / 2.0 < radius, height / 2.0 < radius) {
        (true, true) => {
            cr.move_to(x0, (y0 + y1) / 2.0)
                .curve_to(x0, y0, x0, y0, (x0 + x1) / 2.0, y0)
                .curve_to(x1, y0, x1, y0, x1, (y0 + y1) / 2.0)
                .curve_to(x1, y1, x1, y1, (x1 + x0) / 2.0, y1)
                .curve_to(x0, y1, x0, y1, x0, (y0 + y1) / 2.0);
        }
        (true, false) => {
            cr.move_to(x0, y0 + radius)
                .curve_to(x0, y0, x0, y0, (x0 + x1) / 2.0, y0)
                .curve_to(x1, y0, x1, y0, x1, y0 + radius)
                .line_to(x1, y1 - radius)
                .curve_to(x1, y1, x1, y1, (x1 + x0) / 2.0, y1)
                .curve_to(x0, y1, x0, y1, x0, y1 - radius);
        }
        (false, true) => {
            cr.move_to(x0, (y0 + y1) / 2.0)
                .curve_to(x0, y0, x0, y0, x0 + radius, y0)
                .line_to(x1 - radius, y0)
                .curve_to(x1, y0, x1, y0, x1, (y0 + y1) / 2.0)
                .curve_to(x1, y1, x1, y1, x1 - radius, y1)
                .line_to(x0 + radius, y1)
                .curve_to(x0, y1, x0, y1, x0, (y0 + y1) / 2.0);
        }
        (false, false) => {
            cr.move_to(x0, y0 + radius)
                .curve_to(x0, y0, x0, y0, x0 + radius, y0)
                .line_to(x1 - radius, y0)
                .curve_to(x1, y0, x1, y0, x1, y0 + radius)
                .line_to(x1, y1 - radius)
                .curve_to(x1, y1, x1, y1, x1 - radius, y1)
                .line_to(x0 + radius, y1)
                .curve_to(x0, y1, x0, y1, x0, y1 - radius);
        }
    }
    cr.close_path();

    cr.set_source_rgb(0.5, 0.5, 1.0);
    cr.fill_preserve();
    cr.set_source_rgba(0.5, 0.0, 0.0, 0.5);
    cr.set_line_width(10.0);
    cr.stroke();
}

fn curve_to(cr: &Context, _: &Assets) {
    let (x, y) = (25.6, 128.0);
    let (x1, y1, x2, y2, x3, y3) = (102.4, 230.4, 153.6, 25.6, 230.4, 128.0);

    cr.move_to(x, y).curve_to(x1, y1, x2, y2, x3, y3);
    cr.set_line_width(10.0);
    cr.stroke();

    cr.set_source_rgba(1.0, 0.2, 0.2, 0.6);
    cr.set_line_width(6.0);
    cr.move_to(x, y).line_to(x1, y1).move_to(x2, y2).line_to(x3, y3);
    cr.stroke();
}

fn dash(cr: &Context, _: &Assets) {
    cr.set_dash(&[50.0, 10.0, 10.0, 10.0], -50.0);
    cr.set_line_width(10.0);

    cr.move_to(128.0, 25.6)
        .line_to(230.4, 230.4)
        .rel_line_to(-102.4, 0.0)
        .curve_to(51.2, 230.4, 51.2, 128.0, 128.0, 128.0);
    cr.stroke();
}

fn fill_and_stroke(cr: &Context, _: &Assets) {
    cr.move_to(128.0, 25.6)
        .line_to(230.4, 230.4)
        .rel_line_to(-102.4, 0.0)
        .curve_to(51.2, 230.4, 51.2, 128.0, 128.0, 128.0)
        .close_path();

    cr.move_to(64.0, 25.6)
        .rel_line_to(51.2, 51.2)
        .rel_line_to(-51.2, 51.2)
        .rel_line_to(-51.2, -51.2)
        .close_path();

    cr.set_line_width(10.0);
    cr.set_source_rgb(0.0, 0.0, 1.0);
    cr.fill_preserve();
    cr.set_source_rgb(0.0, 0.0, 0.0);
    cr.stroke();
}

fn fill_style(cr: &Context, _: &Assets) {
    cr.set_line_width(6.0);

    for (rule, color) in [
        (FillRule::EvenOdd, Color::rgb(0.0, 0.7, 0.0)),
        (FillRule::Winding, Color::rgb(0.0, 0.0, 0.9)),
    ]
    .iter()
    {
        cr.rectangle(12.0, 12.0, 232.0, 70.0);
        cr.new_sub_path().arc(64.0, 64.0, 40.0, 0.0, 2.0 * PI);
        cr.new_sub_path().arc_negative(192.0, 64.0, 40.0, 0.0, -2.0 * PI);

        cr.set_fill_rule(*rule);
        cr.set_source_color(*color);
        cr.fill_preserve();
        cr.set_source_rgb(0.0, 0.0, 0.0);
        cr.stroke();

        cr.translate(0.0, 128.0);
    }
}

fn gradient(cr: &Context, _: &Assets) {
    let linear = LinearGradient::create(Vec2::new(0.0, 0.0), Vec2::new(0.0, 256.0));
    linear.add_color_stop_rgba(1.0, 0.0, 0.0, 0.0, 1.0);
    linear.add_color_stop_rgba(0.0, 1.0, 1.0, 1.0, 1.0);
    cr.rectangle(0.0, 0.0, 256.0, 256.0);
    cr.set_source(&linear);
    cr.fill();

    let radial =
        RadialGradient::create(Vec2::new(115.2, 102.4), 25.6, Vec2::new(102.4, 102.4), 128.0);
    radial.add_color_stop_color(0.0, Color::WHITE);
    radial.add_color_stop_color(1.0, Color::BLACK);
    cr.set_source(&radial);
    cr.arc(128.0, 128.0, 76.8, 0.0, 2.0 * PI);
    cr.fill();
}

fn group(cr: &Context, _: &Assets) {
    cr.push_group();
    cr.set_source_rgb(0.9, 0.4, 0.1);
    cr.rectangle(32.0, 32.0, 128.0, 128.0).fill();
    cr.set_source_rgb(0.1, 0.4, 0.9);
    cr.rectangle(96.0, 96.0, 128.0, 128.0).fill();
    cr.pop_group_to_source();
    cr.paint_with_alpha(0.5);
}

fn image(cr: &Context, assets: &Assets) {
    let size = assets.image.size();
    let (w, h) = (f64::from(size.x), f64::from(size.y));

    cr.translate(128.0, 128.0)
        .rotate(45.0 * PI / 180.0)
        .scale(256.0 / w, 256.0 / h)
        .translate(-0.5 * w, -0.5 * h);

    cr.set_source_surface(&assets.image, 0.0, 0.0);
    cr.paint();
}

fn image_pattern(cr: &Context, assets: &Assets) {
    let size = assets.image.size();
    let (w, h) = (f64::from(size.x), f64::from(size.y));

    let pattern = SurfacePattern::create(&assets.image);
    pattern.set_extend(Extend::Repeat);

    cr.translate(128.0, 128.0)
        .rotate(PI / 4.0)
        .scale(1.0 / SQRT_2, 1.0 / SQRT_2)
        .translate(-128.0, -128.0);

    pattern.set_matrix(&Matrix::scaling(w / 256.0 * 5.0, h / 256.0 * 5.0));
    cr.set_source(&pattern);

    cr.rectangle(0.0, 0.0, 256.0, 256.0);
    cr.fill();
}

fn multi_segments_cap(cr: &Context, _: &Assets) {
    cr.move_to(50.0, 75.0).line_to(200.0, 75.0);
    cr.move_to(50.0, 125.0).line_to(200.0, 125.0);
    cr.move_to(50.0, 175.0).line_to(200.0, 175.0);

    cr.set_line_width(30.0);
    cr.set_line_cap(LineCap::Round);
    cr.stroke();
}

fn pattern(cr: &Context, _: &Assets) {
    let tile = ImageSurface::create(Format::Argb32, 32, 32);
    {
        let tile_cr = Context::create(&tile);
        tile_cr.set_source_rgb(0.8, 0.8, 0.8);
        tile_cr.paint();
        tile_cr.set_source_rgb(0.2, 0.2, 0.6);
        tile_cr.rectangle_rect(Rect::new(0.0, 0.0, 16.0, 16.0)).fill();
        tile_cr.rectangle_rect(Rect::new(16.0, 16.0, 16.0, 16.0)).fill();
    }

    let checker = SurfacePattern::create(&tile);
    checker.set_extend(Extend::Repeat);

    let cr = StateGuard::new(cr);
    cr.translate(128.0, 128.0).rotate(PI / 6.0).translate(-128.0, -128.0);
    cr.set_source(&checker);
    cr.arc(128.0, 128.0, 110.0, 0.0, 2.0 * PI);
    cr.fill();
}

fn rounded_rectangle(cr: &Context, _: &Assets) {
    let area = Rect::new(25.6, 25.6, 204.8, 204.8);
    let radius = area.height / 10.0;
    let degrees = PI / 180.0;
    let (x, y, w, h) = (area.x, area.y, area.width, area.height);

    cr.new_sub_path()
        .arc(x + w - radius, y + radius, radius, -90.0 * degrees, 0.0)
        .arc(x + w - radius, y + h - radius, radius, 0.0, 90.0 * degrees)
        .arc(x + radius, y + h - radius, radius, 90.0 * degrees, 180.0 * degrees)
        .arc(x + radius, y + radius, radius, 180.0 * degrees, 270.0 * degrees)
        .close_path();

    cr.set_source_rgb(0.5, 0.5, 1.0);
    cr.fill_preserve();
    cr.set_source_rgba(0.5, 0.0, 0.0, 0.5);
    cr.set_line_width(10.0);
    cr.stroke();
}

fn set_line_cap(cr: &Context, _: &Assets) {
    let xs = [64.0, 128.0, 192.0];

    cr.set_line_width(30.0);
    for (x, cap) in xs.iter().zip(&[LineCap::Butt, LineCap::Round, LineCap::Square]) {
        cr.set_line_cap(*cap);
        cr.move_to(*x, 50.0).line_to(*x, 200.0);
        cr.stroke();
    }

    cr.set_source_rgb(1.0, 0.2, 0.2);
    cr.set_line_width(2.56);
    for x in &xs {
        cr.move_to(*x, 50.0).line_to(*x, 200.0);
    }
    cr.stroke();
}

fn set_line_join(cr: &Context, _: &Assets) {
    cr.set_line_width(40.96);
    for (y, join) in [84.48, 161.28, 238.08]
        .iter()
        .zip(&[LineJoin::Miter, LineJoin::Bevel, LineJoin::Round])
    {
        cr.move_to(76.8, *y).rel_line_to(51.2, -51.2).rel_line_to(51.2, 51.2);
        cr.set_line_join(*join);
        cr.stroke();
    }
}

/// A small generated landscape, written as PNG and read back.
fn landscape(dir: &Path) -> Result<ImageSurface, Box<dyn Error>> {
    let surface = ImageSurface::create(Format::Rgb24, 400, 300);
    {
        let cr = Context::create(&surface);

        let sky = LinearGradient::create(Vec2::new(0.0, 0.0), Vec2::new(0.0, 180.0));
        sky.add_color_stop_rgb(0.0, 0.25, 0.45, 0.85);
        sky.add_color_stop_rgb(1.0, 0.85, 0.9, 1.0);
        cr.set_source(&sky);
        cr.paint();

        cr.set_source_rgb(0.3, 0.45, 0.3);
        cr.move_to(0.0, 190.0)
            .line_to(110.0, 70.0)
            .line_to(200.0, 160.0)
            .line_to(290.0, 90.0)
            .line_to(400.0, 190.0)
            .line_to(400.0, 300.0)
            .line_to(0.0, 300.0)
            .close_path();
        cr.fill();

        cr.set_source_rgba(0.2, 0.4, 0.7, 0.9);
        cr.rectangle(0.0, 210.0, 400.0, 90.0).fill();

        if cr.status() != Status::Success {
            return Err(cr.status().description().into());
        }
    }

    let path = dir.join("landscape.png");
    surface.write_to_png(&path)?;
    load(&path)
}

fn load(path: &Path) -> Result<ImageSurface, Box<dyn Error>> {
    let image = ImageSurface::create_from_png(path);
    match image.status() {
        Status::Success => Ok(image),
        status => Err(format!("cannot load {}: {}", path.display(), status).into()),
    }
}

fn render(name: &str, sample: Sample, assets: &Assets, dir: &Path) -> Result<PathBuf, Box<dyn Error>> {
    let surface = ImageSurface::create(Format::Argb32, SIZE, SIZE);
    let cr = Context::create(&surface);
    cr.scale(2.0, 2.0);
    {
        let cr = StateGuard::new(&cr);
        cr.set_source_rgb(0.95, 0.95, 0.95);
        cr.paint();
    }
    sample(&cr, assets);

    if cr.status() != Status::Success {
        tracing::warn!("sample {} left the context in status: {}", name, cr.status());
    }

    let path = dir.join(format!("{}.png", name));
    surface.write_to_png(&path)?;
    Ok(path)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args_os().skip(1);
    let dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("vellum-samples"));
    std::fs::create_dir_all(&dir)?;

    let image = match args.next() {
        Some(path) => load(Path::new(&path))?,
        None => landscape(&dir)?,
    };
    let assets = Assets { image };

    let samples: &[(&str, Sample)] = &[
        ("arc", arc),
        ("arc_negative", arc_negative),
        ("clip", clip),
        ("clip_image", clip_image),
        ("curve_rectangle", curve_rectangle),
        ("curve_to", curve_to),
        ("dash", dash),
        ("fill_and_stroke", fill_and_stroke),
        ("fill_style", fill_style),
        ("gradient", gradient),
        ("group", group),
        ("image", self::image),
        ("image_pattern", image_pattern),
        ("multi_segments_cap", multi_segments_cap),
        ("pattern", pattern),
        ("rounded_rectangle", rounded_rectangle),
        ("set_line_cap", set_line_cap),
        ("set_line_join", set_line_join),
    ];

    for (name, sample) in samples {
        tracing::info!("executing '{}'", name);
        let path = render(name, *sample, &assets, &dir)?;
        tracing::info!("wrote {}", path.display());
    }

    Ok(())
}
