use crate::{
    error::{FitroomError, Result},
    models::{EncodedImage, PoseTemplate, Scenario},
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{imageops::FilterType, DynamicImage};
use std::io::Cursor;

/// Normalization bounds for the reference configuration.
pub const SUBJECT_MAX_WIDTH: u32 = 1024;
pub const SUBJECT_MAX_HEIGHT: u32 = 1024;
pub const GARMENT_MAX_WIDTH: u32 = 512;
pub const GARMENT_MAX_HEIGHT: u32 = 512;

const JPEG_QUALITY: u8 = 90;

/// Computes the output dimensions for an image bounded to `max_width` x
/// `max_height`: the longer side is clamped to its maximum and the shorter
/// side scaled proportionally, rounded to the nearest pixel. Images already
/// within bounds keep their dimensions.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let mut out_width = width;
    let mut out_height = height;

    if width > height {
        if width > max_width {
            out_height = ((height as f64 * max_width as f64) / width as f64).round() as u32;
            out_width = max_width;
        }
    } else if height > max_height {
        out_width = ((width as f64 * max_height as f64) / height as f64).round() as u32;
        out_height = max_height;
    }

    (out_width.max(1), out_height.max(1))
}

/// Decodes an arbitrary source image, bounds it to the given maximum
/// dimensions preserving aspect ratio, and re-encodes it as base64 JPEG.
/// Fails with `ImageDecodeError` before any network call is made.
pub fn normalize(bytes: &[u8], max_width: u32, max_height: u32) -> Result<EncodedImage> {
    let source = image::load_from_memory(bytes)
        .map_err(|e| FitroomError::ImageDecodeError(e.to_string()))?;

    let (width, height) = (source.width(), source.height());
    let (target_width, target_height) = fit_within(width, height, max_width, max_height);

    let bounded = if (target_width, target_height) != (width, height) {
        source.resize_exact(target_width, target_height, FilterType::Triangle)
    } else {
        source
    };

    // JPEG has no alpha channel; flatten before encoding.
    let rgb = DynamicImage::ImageRgb8(bounded.to_rgb8());

    let mut buffer = Cursor::new(Vec::new());
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY);
    rgb.write_with_encoder(encoder)
        .map_err(|e| FitroomError::ImageDecodeError(e.to_string()))?;

    Ok(EncodedImage::new(
        "image/jpeg",
        BASE64.encode(buffer.into_inner()),
    ))
}

pub fn normalize_subject(bytes: &[u8]) -> Result<EncodedImage> {
    normalize(bytes, SUBJECT_MAX_WIDTH, SUBJECT_MAX_HEIGHT)
}

pub fn normalize_garment(bytes: &[u8]) -> Result<EncodedImage> {
    normalize(bytes, GARMENT_MAX_WIDTH, GARMENT_MAX_HEIGHT)
}

/// Builds the synthesis instruction for one (pose, scenario, forced-size?)
/// combination. With a forced size the service is ordered to echo it
/// verbatim instead of recomputing it.
pub fn build_instruction(
    pose: &PoseTemplate,
    scenario: &Scenario,
    forced_size: Option<&str>,
) -> String {
    let pose_instruction = format!(
        "La nueva pose debe ser: {} - {}",
        pose.name, pose.description
    );

    let scenario_instruction = if scenario.keeps_original_background() {
        "El fondo debe permanecer EXACTAMENTE IGUAL al de la foto original del usuario. \
         No lo alteres, modifiques o reemplaces. La única tarea es cambiar la ropa de la \
         persona, manteniendo su fondo original intacto."
            .to_string()
    } else {
        format!(
            "El fondo debe ser un escenario de tipo '{}': {}",
            scenario.name, scenario.description
        )
    };

    let size_instruction = match forced_size {
        Some(size) => format!(
            "Instrucción de Talla Obligatoria: la talla para esta persona ya ha sido \
             determinada. DEBES usar la siguiente talla y devolverla en tu respuesta de \
             texto sin alterarla: `{}`. Tu respuesta de texto debe contener ÚNICAMENTE la \
             talla proporcionada. NO la recalcules.",
            size
        ),
        None => "Primero, analiza la complexión de la persona en la foto original para \
                 determinar su talla. Si la persona es visiblemente esbelta, sugiere 'S' o \
                 'M'; complexión media, 'M' o 'L'; figura de talla grande, 'XL', 'XXL' o \
                 superior. Sé realista y respetuoso. Tu respuesta de texto debe contener \
                 ÚNICAMENTE la talla determinada (tallas posibles: XS, S, M, L, XL, XXL, \
                 3XL), y esa talla debe ser la misma para todas las poses."
            .to_string(),
    };

    format!(
        "Misión: Reemplazo de Ropa Virtual con Fidelidad Humana Absoluta.\n\
         \n\
         Toma a la persona de la primera imagen (foto del usuario) y REEMPLAZA \
         COMPLETAMENTE su atuendo con la prenda de la segunda imagen (foto de la \
         prenda). El resultado debe ser una fotografía indistinguible de la realidad.\n\
         \n\
         Reglas inquebrantables:\n\
         1. IDENTIDAD FACIAL INALTERABLE: el rostro final debe ser una copia 1:1 del \
         rostro original. No rejuvenezcas, embellezcas ni alteres el rostro de ninguna \
         manera.\n\
         2. CERO RASTROS DE LA ROPA ORIGINAL: la ropa original debe desaparecer por \
         completo, sin dejar mangas, colores ni texturas.\n\
         3. FIDELIDAD ABSOLUTA DE LA PRENDA: la prenda generada debe ser una réplica \
         exacta de la segunda imagen; prohibido alterar diseño, patrón, color o forma.\n\
         4. VESTIMENTA INFERIOR OBLIGATORIA: la persona debe llevar una prenda inferior \
         natural (pantalones, jeans) si la original no es visible.\n\
         5. FIDELIDAD CORPORAL ABSOLUTA: mantén exactamente el tipo de cuerpo, altura y \
         proporciones del sujeto original; prohibido adelgazar o alterar su figura.\n\
         6. AJUSTE REALISTA: la prenda debe ajustarse de forma natural al cuerpo; si \
         parece pequeña, renderízala en una talla mayor.\n\
         7. CONSISTENCIA DE TALLA: la talla sugerida debe ser idéntica para todas las \
         imágenes de esta sesión.\n\
         8. POSE Y ESCENARIO: {pose} La pose solo aplica al cuerpo. {scenario} Integra \
         al sujeto con iluminación y sombras coherentes.\n\
         9. CALIDAD FOTOGRÁFICA: imagen nítida, fotorrealista, a color y rectangular, \
         sin artefactos ni texto.\n\
         10. CONTENIDO: la imagen final DEBE ser de la persona con su nueva ropa, nada \
         más.\n\
         \n\
         Tarea adicional obligatoria (respuesta de texto):\n\
         {size}",
        pose = pose_instruction,
        scenario = scenario_instruction,
        size = size_instruction,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{POSES, SCENARIOS};
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
    use image::{ImageBuffer, Rgb};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgb::<u8>([120, 30, 60]));
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buffer, image::ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    #[test]
    fn fit_within_clamps_the_longer_side() {
        assert_eq!(fit_within(2000, 3000, 1024, 1024), (683, 1024));
        assert_eq!(fit_within(3000, 2000, 1024, 1024), (1024, 683));
    }

    #[test]
    fn fit_within_never_upscales() {
        assert_eq!(fit_within(800, 600, 1024, 1024), (800, 600));
        assert_eq!(fit_within(512, 512, 512, 512), (512, 512));
    }

    #[test]
    fn fit_within_handles_extreme_ratios() {
        let (w, h) = fit_within(10000, 2, 1024, 1024);
        assert_eq!(w, 1024);
        assert!(h >= 1);
    }

    #[test]
    fn normalize_bounds_and_reencodes_as_jpeg() {
        let source = png_bytes(2000, 3000);
        let encoded = normalize(&source, 1024, 1024).unwrap();
        assert_eq!(encoded.mime_type, "image/jpeg");

        let decoded = BASE64.decode(&encoded.data).unwrap();
        let roundtrip = image::load_from_memory(&decoded).unwrap();
        assert_eq!((roundtrip.width(), roundtrip.height()), (683, 1024));
    }

    #[test]
    fn normalize_keeps_small_images_untouched() {
        let source = png_bytes(300, 200);
        let encoded = normalize_garment(&source).unwrap();
        let decoded = BASE64.decode(&encoded.data).unwrap();
        let roundtrip = image::load_from_memory(&decoded).unwrap();
        assert_eq!((roundtrip.width(), roundtrip.height()), (300, 200));
    }

    #[test]
    fn normalize_rejects_undecodable_input() {
        let err = normalize(b"definitely not an image", 1024, 1024).unwrap_err();
        assert!(matches!(err, FitroomError::ImageDecodeError(_)));
    }

    #[test]
    fn instruction_without_forced_size_asks_for_determination() {
        let instruction = build_instruction(&POSES[0], &SCENARIOS[1], None);
        assert!(instruction.contains(&POSES[0].name));
        assert!(instruction.contains(&SCENARIOS[1].name));
        assert!(instruction.contains("determinar su talla"));
    }

    #[test]
    fn instruction_with_forced_size_orders_an_echo() {
        let instruction = build_instruction(&POSES[1], &SCENARIOS[1], Some("M"));
        assert!(instruction.contains("`M`"));
        assert!(instruction.contains("NO la recalcules"));
    }

    #[test]
    fn original_scenario_keeps_the_background() {
        let instruction = build_instruction(&POSES[0], &SCENARIOS[0], None);
        assert!(instruction.contains("EXACTAMENTE IGUAL"));
    }
}
