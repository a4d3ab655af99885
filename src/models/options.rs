use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Static descriptor of a body pose injected into the instruction text.
/// Order in [`POSES`] defines which call is the determining one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PoseTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl PoseTemplate {
    pub fn new(id: &str, name: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
        }
    }
}

/// A backdrop the subject is placed into. `scenario-0` is special: it keeps
/// the original photo's background untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Scenario {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image: Option<String>,
}

impl Scenario {
    pub fn new(id: &str, name: &str, description: &str, image: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            image: image.map(String::from),
        }
    }

    pub fn keeps_original_background(&self) -> bool {
        self.id == "scenario-0"
    }
}

pub static POSES: Lazy<Vec<PoseTemplate>> = Lazy::new(|| {
    vec![
        PoseTemplate::new(
            "pose-1",
            "Fotografía de Estudio",
            "Una pose de cuerpo completo, mirando a la cámara, similar a una sesión de fotos profesional. El sujeto debe mantener su apariencia y rostro originales.",
        ),
        PoseTemplate::new(
            "pose-2",
            "Pose de Tres Cuartos",
            "Una pose de tres cuartos, con el cuerpo ligeramente girado, mostrando una postura segura. El sujeto debe mantener su apariencia y rostro originales.",
        ),
        PoseTemplate::new(
            "pose-3",
            "Pose Relajada",
            "Una pose informal y relajada, con una expresión natural y cómoda. El sujeto debe mantener su apariencia y rostro originales.",
        ),
    ]
});

pub static SCENARIOS: Lazy<Vec<Scenario>> = Lazy::new(|| {
    vec![
        Scenario::new(
            "scenario-0",
            "Original",
            "Un fondo neutro de una tienda moderna sin marca.",
            Some("https://images.unsplash.com/photo-1555529771-835f59fc5efe?q=80&w=800"),
        ),
        Scenario::new(
            "scenario-1",
            "Urbano",
            "Una concurrida calle de ciudad con arquitectura moderna.",
            Some("https://images.unsplash.com/photo-1581456495146-65a71b2c8e52?q=80&w=800"),
        ),
        Scenario::new(
            "scenario-2",
            "Verano",
            "Una escena veraniega y soleada en la playa.",
            Some("https://images.unsplash.com/photo-1473496169904-658ba7c44d8a?q=80&w=800"),
        ),
        Scenario::new(
            "scenario-3",
            "Otoño",
            "Un hermoso parque durante el otoño con hojas de colores.",
            Some("https://images.unsplash.com/photo-1476820865390-c52aeebb9891?q=80&w=800"),
        ),
        Scenario::new(
            "scenario-4",
            "Deporte",
            "Modelando la prenda en una cancha deportiva moderna.",
            Some("https://images.pexels.com/photos/209977/pexels-photo-209977.jpeg?auto=compress&cs=tinysrgb&w=800"),
        ),
        Scenario::new(
            "scenario-5",
            "Senderismo",
            "Una aventura de trekking en un paisaje montañoso.",
            Some("https://images.unsplash.com/photo-1551632811-561732d1e306?q=80&w=800"),
        ),
    ]
});
