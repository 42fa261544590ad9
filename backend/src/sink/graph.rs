//! Variante moderna del sink: token v2 de Azure AD y subida por Graph.
//!
//! Flujo por subida: token → resolver sitio (cacheado) → resolver
//! biblioteca por nombre visible → `PUT .../content`.

use async_trait::async_trait;
use log::info;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::sink::RemoteSink;

const GRAPH: &str = "https://graph.microsoft.com/v1.0";

pub struct GraphSink {
    cliente: reqwest::Client,
    client_id: String,
    client_secret: String,
    tenant_id: String,
    site_url: String,
    biblioteca: String,
    carpeta: String,
    documento: String,
    /// Identificador del sitio resuelto una sola vez por proceso. Es el
    /// único estado que sobrevive entre peticiones.
    site_id: RwLock<Option<String>>,
}

impl GraphSink {
    pub fn new(cliente: reqwest::Client, config: &Config) -> Self {
        Self {
            cliente,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            tenant_id: config.tenant_id.clone(),
            site_url: config.site_url.clone(),
            biblioteca: config.biblioteca.clone(),
            carpeta: config.carpeta.clone(),
            documento: config.documento.clone(),
            site_id: RwLock::new(None),
        }
    }

    async fn obtener_token(&self) -> Result<String, String> {
        let url = format!(
            "https://login.microsoftonline.com/{}/oauth2/v2.0/token",
            self.tenant_id
        );
        let respuesta = self
            .cliente
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", "https://graph.microsoft.com/.default"),
            ])
            .send()
            .await
            .map_err(|e| format!("token: {e}"))?;

        if !respuesta.status().is_success() {
            return Err(format!("token: HTTP {}", respuesta.status().as_u16()));
        }
        let cuerpo: Value = respuesta.json().await.map_err(|e| format!("token: {e}"))?;
        cuerpo
            .get("access_token")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| "token: la respuesta no trae access_token".to_string())
    }

    async fn resolver_sitio(&self, token: &str) -> Result<String, String> {
        if let Some(id) = self.site_id.read().await.clone() {
            return Ok(id);
        }

        let url = url_sitio(&self.site_url);
        let respuesta = self
            .cliente
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| format!("sitio: {e}"))?;
        if !respuesta.status().is_success() {
            return Err(format!(
                "sitio {}: HTTP {}",
                self.site_url,
                respuesta.status().as_u16()
            ));
        }
        let cuerpo: Value = respuesta.json().await.map_err(|e| format!("sitio: {e}"))?;
        let id = cuerpo
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| "sitio: la respuesta no trae id".to_string())?
            .to_string();

        *self.site_id.write().await = Some(id.clone());
        Ok(id)
    }

    async fn resolver_biblioteca(&self, token: &str, site_id: &str) -> Result<String, String> {
        let url = format!("{GRAPH}/sites/{site_id}/drives");
        let respuesta = self
            .cliente
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| format!("bibliotecas: {e}"))?;
        if !respuesta.status().is_success() {
            return Err(format!(
                "bibliotecas: HTTP {}",
                respuesta.status().as_u16()
            ));
        }
        let cuerpo: Value = respuesta
            .json()
            .await
            .map_err(|e| format!("bibliotecas: {e}"))?;
        let drives = cuerpo
            .get("value")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        buscar_biblioteca(&drives, &self.biblioteca)
    }
}

#[async_trait]
impl RemoteSink for GraphSink {
    async fn subir(&self, contenido: &[u8]) -> Result<(), String> {
        let token = self.obtener_token().await?;
        let sitio = self.resolver_sitio(&token).await?;
        let drive = self.resolver_biblioteca(&token, &sitio).await?;

        let url = url_contenido(&sitio, &drive, &self.carpeta, &self.documento);
        let respuesta = self
            .cliente
            .put(&url)
            .bearer_auth(&token)
            .header("Content-Type", "application/octet-stream")
            .body(contenido.to_vec())
            .send()
            .await
            .map_err(|e| format!("subida: {e}"))?;

        match respuesta.status().as_u16() {
            200 | 201 => {
                info!(
                    "Ledger subido a {}/{} ({} bytes)",
                    self.carpeta,
                    self.documento,
                    contenido.len()
                );
                Ok(())
            }
            otro => Err(format!("subida: HTTP {otro}")),
        }
    }
}

/// `https://contoso.sharepoint.com/sites/altas` →
/// `.../v1.0/sites/contoso.sharepoint.com:/sites/altas`.
fn url_sitio(site_url: &str) -> String {
    let sin_esquema = site_url
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    match sin_esquema.split_once('/') {
        Some((host, ruta)) => format!("{GRAPH}/sites/{host}:/{ruta}"),
        None => format!("{GRAPH}/sites/{sin_esquema}"),
    }
}

/// URL de subida con reemplazo de contenido, acotada al sitio resuelto.
fn url_contenido(sitio: &str, drive: &str, carpeta: &str, documento: &str) -> String {
    format!("{GRAPH}/sites/{sitio}/drives/{drive}/root:/{carpeta}/{documento}:/content")
}

/// Busca la biblioteca por su nombre visible. Si no hay coincidencia el
/// error enumera las disponibles, que es lo único accionable para quien
/// configura el servicio.
fn buscar_biblioteca(drives: &[Value], nombre: &str) -> Result<String, String> {
    for drive in drives {
        if drive.get("name").and_then(Value::as_str) == Some(nombre) {
            return drive
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| format!("biblioteca '{nombre}' sin id en la respuesta"));
        }
    }
    let disponibles: Vec<&str> = drives
        .iter()
        .filter_map(|d| d.get("name").and_then(Value::as_str))
        .collect();
    Err(format!(
        "biblioteca '{}' no encontrada; disponibles: [{}]",
        nombre,
        disponibles.join(", ")
    ))
}
