//! Materializa los adjuntos del formulario en el directorio local.
//!
//! Cada adjunto ocupa uno de cinco "slots" con nombre fijo. Un adjunto
//! ausente o ilegible se registra como cadena vacía en el ledger; nunca
//! tumba la petición.

use std::fs;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use actix_multipart::Field;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Local;
use futures_util::StreamExt;
use log::warn;

use common::model::registro::Registro;

/// Nombres de archivo por slot, en el mismo orden que las últimas cinco
/// columnas del ledger.
#[derive(Debug, Clone, Default)]
pub struct NombresAdjuntos {
    pub ine_frente: String,
    pub ine_reverso: String,
    pub curp_archivo: String,
    pub documentos: String,
    pub foto: String,
}

impl NombresAdjuntos {
    /// Asigna el nombre guardado al slot indicado; los nombres de parte
    /// desconocidos se ignoran.
    pub fn asignar(&mut self, slot: &str, nombre: String) {
        match slot {
            "ine_frente" => self.ine_frente = nombre,
            "ine_reverso" => self.ine_reverso = nombre,
            "curp_archivo" => self.curp_archivo = nombre,
            "documentos" => self.documentos = nombre,
            "foto" => self.foto = nombre,
            _ => {}
        }
    }
}

pub fn es_slot(nombre: &str) -> bool {
    matches!(
        nombre,
        "ine_frente" | "ine_reverso" | "curp_archivo" | "documentos" | "foto"
    )
}

/// Guarda los cinco adjuntos base64 de un cuerpo JSON.
pub fn guardar_adjuntos_base64(dir: &Path, datos: &Registro) -> NombresAdjuntos {
    NombresAdjuntos {
        ine_frente: guardar_base64(dir, "ine_frente", &datos.ine_frente),
        ine_reverso: guardar_base64(dir, "ine_reverso", &datos.ine_reverso),
        curp_archivo: guardar_base64(dir, "curp_archivo", &datos.curp_archivo),
        documentos: guardar_base64(dir, "documentos", &datos.documentos_base64),
        foto: guardar_base64(dir, "foto", &datos.foto_base64),
    }
}

/// Decodifica un data URI base64 y lo escribe como
/// `<slot>_<YYYYMMDDHHMMSS><ext>`. Devuelve el nombre del archivo, o
/// cadena vacía si no había adjunto o no se pudo decodificar.
///
/// La extensión sale de un clasificador de dos cubetas: si la cabecera
/// del data URI menciona "image" es `.jpg`, cualquier otra cosa es
/// `.pdf`. No hay inspección real del contenido. Dos adjuntos del mismo
/// slot en el mismo segundo chocan de nombre y gana el último.
pub fn guardar_base64(dir: &Path, slot: &str, payload: &str) -> String {
    if payload.is_empty() {
        return String::new();
    }

    let ext = if payload.contains("image") { ".jpg" } else { ".pdf" };
    let cuerpo = match payload.split_once(',') {
        Some((_, resto)) => resto,
        None => payload,
    };

    let bytes = match STANDARD.decode(cuerpo) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Adjunto '{slot}' con base64 inválido, se registra vacío: {e}");
            return String::new();
        }
    };

    let nombre = format!("{}_{}{}", slot, Local::now().format("%Y%m%d%H%M%S"), ext);
    if let Err(e) = fs::write(dir.join(&nombre), &bytes) {
        warn!("No se pudo escribir el adjunto '{slot}', se registra vacío: {e}");
        return String::new();
    }
    nombre
}

/// Guarda una parte de archivo multipart por copia en streaming, sin
/// pasar por base64. El nombre conserva el del archivo original,
/// prefijado con slot y timestamp.
pub async fn guardar_parte(
    dir: &Path,
    slot: &str,
    field: &mut Field,
) -> Result<String, Box<dyn std::error::Error>> {
    let original = field
        .content_disposition()
        .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
        .unwrap_or_default();

    let nombre = format!(
        "{}_{}_{}",
        slot,
        Local::now().format("%Y%m%d%H%M%S"),
        original
    );
    let mut archivo = File::create(dir.join(&nombre))?;
    while let Some(chunk) = field.next().await {
        archivo.write_all(&chunk?)?;
    }
    Ok(nombre)
}
