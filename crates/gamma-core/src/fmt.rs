//! Plain-text rendering of nested images, used by the command line tools.

fn value_to_string(value: f32, precision: Option<usize>) -> String {
    if value.is_nan() {
        return "nan".into();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf".into() } else { "-inf".into() };
    }
    match precision {
        Some(p) => format!("{value:.p$}"),
        None => format!("{value}"),
    }
}

fn row_to_string(row: &[f32], precision: Option<usize>) -> String {
    let items: Vec<String> = row.iter().map(|&v| value_to_string(v, precision)).collect();
    format!("[{}]", items.join(", "))
}

/// Render a nested 2D image, one row per line.
pub fn image_2d_to_string(image: &[Vec<f32>], precision: Option<usize>) -> String {
    let rows: Vec<String> = image.iter().map(|r| row_to_string(r, precision)).collect();
    format!("[{}]", rows.join(",\n "))
}

/// Render a nested 3D image, frames separated by blank-indented rows.
pub fn image_3d_to_string(image: &[Vec<Vec<f32>>], precision: Option<usize>) -> String {
    let frames: Vec<String> = image
        .iter()
        .map(|frame| {
            let rows: Vec<String> = frame.iter().map(|r| row_to_string(r, precision)).collect();
            format!("[{}]", rows.join(",\n  "))
        })
        .collect();
    format!("[{}]", frames.join(",\n "))
}
