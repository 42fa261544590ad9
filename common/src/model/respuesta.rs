use serde::{Deserialize, Serialize};

/// Respuesta del endpoint de registro.
///
/// Éxito: `200 {"ok": true}`. Fallo: `500 {"ok": false, "error": "..."}`.
/// Esta es la forma canónica que espera el script del formulario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Respuesta {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Respuesta {
    pub fn exito() -> Self {
        Self { ok: true, error: None }
    }

    pub fn fallo(mensaje: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(mensaje.into()),
        }
    }
}
