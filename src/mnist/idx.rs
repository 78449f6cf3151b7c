use crate::error::{Result, SnnError};

const IMAGE_HEADER: usize = 16;
const LABEL_HEADER: usize = 8;

/// Parses an IDX3 image file and an IDX1 label file (the MNIST byte format)
/// into `(inputs, labels)`.
///
/// # IDX3 image file layout
/// ```text
/// bytes  0-1:   0x00 0x00   (reserved)
/// byte   2:     0x08        (dtype = uint8)
/// byte   3:     0x03        (dimensions)
/// bytes  4-7:   N           (images, big-endian u32)
/// bytes  8-11:  rows        (big-endian u32)
/// bytes 12-15:  cols        (big-endian u32)
/// bytes 16..:   N * rows * cols pixels, row-major
/// ```
///
/// # IDX1 label file layout
/// ```text
/// bytes  0-1:   0x00 0x00
/// byte   2:     0x08
/// byte   3:     0x01
/// bytes  4-7:   N           (labels, big-endian u32)
/// bytes  8..:   N class indices
/// ```
///
/// `inputs[i]` holds `rows * cols` pixels scaled into `[0, 1]`; `labels[i]`
/// is one-hot of length `n_classes`.
pub fn parse_idx_pair(
    image_bytes: &[u8],
    label_bytes: &[u8],
    n_classes: usize,
) -> Result<(Vec<Vec<f64>>, Vec<Vec<f64>>)> {
    check_header(image_bytes, IMAGE_HEADER, 0x03, "image")?;
    check_header(label_bytes, LABEL_HEADER, 0x01, "label")?;

    let n_items = read_u32(image_bytes, 4);
    let rows = read_u32(image_bytes, 8);
    let cols = read_u32(image_bytes, 12);
    let n_pixels = rows
        .checked_mul(cols)
        .ok_or_else(|| malformed(format!("rows * cols overflows (rows={rows}, cols={cols})")))?;
    let image_len = n_items
        .checked_mul(n_pixels)
        .and_then(|n| n.checked_add(IMAGE_HEADER))
        .ok_or_else(|| malformed("image data length overflows".to_owned()))?;

    if image_bytes.len() < image_len {
        return Err(malformed(format!(
            "image file declares {n_items} items of {rows}x{cols} pixels but is only {} bytes",
            image_bytes.len()
        )));
    }

    let label_count = read_u32(label_bytes, 4);
    if label_count != n_items {
        return Err(malformed(format!(
            "image file declares {n_items} items but label file declares {label_count}"
        )));
    }
    if label_bytes.len() < LABEL_HEADER + n_items {
        return Err(malformed(format!(
            "label file declares {n_items} labels but is only {} bytes",
            label_bytes.len()
        )));
    }
    if n_classes < 2 {
        return Err(malformed(format!("n_classes must be at least 2, got {n_classes}")));
    }

    let inputs: Vec<Vec<f64>> = if n_pixels == 0 {
        vec![Vec::new(); n_items]
    } else {
        image_bytes[IMAGE_HEADER..image_len]
            .chunks_exact(n_pixels)
            .map(|chunk| chunk.iter().map(|&px| px as f64 / 255.0).collect())
            .collect()
    };

    let labels = label_bytes[LABEL_HEADER..LABEL_HEADER + n_items]
        .iter()
        .enumerate()
        .map(|(i, &class)| {
            let class = class as usize;
            if class >= n_classes {
                return Err(malformed(format!(
                    "label {i}: class {class} is out of range for {n_classes} classes"
                )));
            }
            let mut one_hot = vec![0.0; n_classes];
            one_hot[class] = 1.0;
            Ok(one_hot)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((inputs, labels))
}

fn check_header(bytes: &[u8], header_len: usize, dimensions: u8, kind: &str) -> Result<()> {
    if bytes.len() < header_len {
        return Err(malformed(format!(
            "{kind} file too short: expected at least {header_len} header bytes, got {}",
            bytes.len()
        )));
    }
    if bytes[0] != 0x00 || bytes[1] != 0x00 {
        return Err(malformed(format!("{kind} file: reserved bytes 0-1 must be zero")));
    }
    if bytes[2] != 0x08 {
        return Err(malformed(format!(
            "{kind} file: dtype must be 0x08 (uint8), got 0x{:02X}",
            bytes[2]
        )));
    }
    if bytes[3] != dimensions {
        return Err(malformed(format!(
            "{kind} file: expected {dimensions} dimensions, got {}",
            bytes[3]
        )));
    }
    Ok(())
}

fn read_u32(bytes: &[u8], offset: usize) -> usize {
    u32::from_be_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
        as usize
}

fn malformed(message: String) -> SnnError {
    SnnError::MalformedDataset(message)
}
