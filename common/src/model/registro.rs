use serde::{Deserialize, Serialize};

/// Un alta de personal tal como la envía el formulario.
///
/// Todos los campos son texto libre y opcionales; un campo ausente se
/// registra como cadena vacía (no hay validación ni coerción de tipos:
/// `edad` se conserva tal cual llega). Los cinco adjuntos viajan como
/// data URIs en base64 cuando el cuerpo es JSON; en un envío multipart
/// llegan como partes de archivo y estos campos quedan vacíos.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Registro {
    pub nombre: String,
    pub edad: String,
    pub curp: String,
    pub rfc: String,
    pub nss: String,
    pub telefono: String,
    pub direccion: String,
    pub leer_escribir: String,
    pub discapacidad: String,
    pub experiencia: String,
    pub salud: String,
    pub origen: String,
    pub observaciones: String,
    pub trabajo_previo: String,
    #[serde(rename = "año_trabajo")]
    pub anio_trabajo: String,
    pub area_trabajo: String,
    pub contacto_emergencia: String,
    pub telefono_emergencia: String,

    // Adjuntos en base64. Las dos últimas claves llevan el sufijo
    // `_base64` que usa el script del formulario; las tres primeras no.
    pub ine_frente: String,
    pub ine_reverso: String,
    pub curp_archivo: String,
    pub documentos_base64: String,
    pub foto_base64: String,
}
