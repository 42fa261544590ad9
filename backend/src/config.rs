//! Configuración del servicio, leída una sola vez al arranque desde
//! variables de entorno.
//!
//! Obligatorias (credenciales del almacén remoto): `CLIENT_ID`,
//! `CLIENT_SECRET`, `TENANT_ID`, `SITE_URL`. El resto tiene valores por
//! defecto razonables para un despliegue sencillo.

use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    /// Credenciales de aplicación para el intercambio client-credentials.
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: String,
    /// URL del sitio remoto, p. ej. `https://contoso.sharepoint.com/sites/altas`.
    pub site_url: String,
    /// Nombre visible de la biblioteca de documentos (solo variante Graph).
    pub biblioteca: String,
    /// Carpeta remota donde se deposita el ledger.
    pub carpeta: String,
    /// Nombre del documento remoto.
    pub documento: String,
    /// Variante del sink remoto: `graph` o `legacy`.
    pub sink: String,
    /// Ruta local del ledger CSV.
    pub ledger_path: String,
    /// Directorio local donde se materializan los adjuntos.
    pub fotos_dir: String,
    /// Timeout de las llamadas HTTP salientes, en segundos.
    pub timeout_segundos: u64,
    pub puerto: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            client_id: requerida("CLIENT_ID")?,
            client_secret: requerida("CLIENT_SECRET")?,
            tenant_id: requerida("TENANT_ID")?,
            site_url: requerida("SITE_URL")?,
            biblioteca: opcional("BIBLIOTECA", "Documentos"),
            carpeta: opcional("CARPETA", "Registros"),
            documento: opcional("DOCUMENTO", "registros.csv"),
            sink: opcional("SINK", "graph"),
            ledger_path: opcional("LEDGER_PATH", "registros.csv"),
            fotos_dir: opcional("FOTOS_DIR", "static/fotos"),
            timeout_segundos: numerica("HTTP_TIMEOUT_SEGUNDOS", 30)?,
            puerto: numerica("PORT", 8080)?,
        })
    }
}

fn requerida(nombre: &str) -> Result<String, String> {
    env::var(nombre).map_err(|_| format!("Falta la variable de entorno {nombre}"))
}

fn opcional(nombre: &str, valor: &str) -> String {
    env::var(nombre).unwrap_or_else(|_| valor.to_string())
}

fn numerica<T: std::str::FromStr>(nombre: &str, valor: T) -> Result<T, String> {
    match env::var(nombre) {
        Ok(texto) => texto
            .parse()
            .map_err(|_| format!("{nombre} debe ser un número, no '{texto}'")),
        Err(_) => Ok(valor),
    }
}
