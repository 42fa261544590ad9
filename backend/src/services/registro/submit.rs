use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use actix_multipart::Multipart;
use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, Responder};
use chrono::Local;
use futures_util::StreamExt;
use log::{error, info};

use common::model::registro::Registro;
use common::model::respuesta::Respuesta;

use crate::services::registro::archivos::{self, NombresAdjuntos};
use crate::state::AppState;

/// Tamaño máximo aceptado para el cuerpo JSON y para cada campo de
/// texto multipart. Las partes de archivo no pasan por memoria: se
/// escriben a disco en streaming.
const LIMITE_CUERPO: usize = 10 * 1024 * 1024; // 10 MB

/// Envoltorio HTTP: convierte el resultado interno en la respuesta
/// canónica del formulario.
///
/// - Éxito: `200 {"ok": true}`.
/// - Fallo: `500 {"ok": false, "error": "..."}`.
pub async fn process(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Payload,
) -> impl Responder {
    match procesar_registro(&state, &req, payload).await {
        Ok(()) => HttpResponse::Ok().json(Respuesta::exito()),
        Err(e) => {
            error!("Error al procesar el registro: {e}");
            HttpResponse::InternalServerError().json(Respuesta::fallo(e.to_string()))
        }
    }
}

/// Tramita un alta completa: parseo, adjuntos, fila, ledger y subida.
///
/// La fila queda escrita en el ledger local antes de intentar la subida
/// remota; un fallo del sink devuelve error al formulario pero no
/// revierte la fila (el remoto se reconcilia en la siguiente subida
/// porque siempre viaja el archivo completo).
async fn procesar_registro(
    state: &AppState,
    req: &HttpRequest,
    payload: web::Payload,
) -> Result<(), Box<dyn Error>> {
    let (datos, adjuntos) = if req.content_type().contains("json") {
        let datos = leer_json(payload).await?;
        let adjuntos = archivos::guardar_adjuntos_base64(&state.fotos_dir, &datos);
        (datos, adjuntos)
    } else {
        let multipart = Multipart::new(req.headers(), payload);
        leer_formulario(&state.fotos_dir, multipart).await?
    };

    let fecha = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let fila = construir_fila(&datos, &adjuntos, &fecha);
    state.ledger.append(&fila)?;
    info!("Alta registrada para '{}'", datos.nombre);

    let contenido = fs::read(state.ledger.ruta())?;
    state.sink.subir(&contenido).await?;
    Ok(())
}

async fn leer_json(mut payload: web::Payload) -> Result<Registro, Box<dyn Error>> {
    let mut cuerpo = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk?;
        if cuerpo.len() + chunk.len() > LIMITE_CUERPO {
            return Err("El cuerpo JSON excede el límite de 10 MB".into());
        }
        cuerpo.extend_from_slice(&chunk);
    }
    Ok(serde_json::from_slice(&cuerpo)?)
}

/// Recorre las partes del formulario multipart: las partes de archivo de
/// los cinco slots se guardan en streaming, el resto se acumula como
/// campos de texto.
async fn leer_formulario(
    dir: &Path,
    mut payload: Multipart,
) -> Result<(Registro, NombresAdjuntos), Box<dyn Error>> {
    let mut campos: HashMap<String, String> = HashMap::new();
    let mut adjuntos = NombresAdjuntos::default();

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let nombre = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()))
            .unwrap_or_default();
        let es_archivo = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .is_some();

        if es_archivo && archivos::es_slot(&nombre) {
            let guardado = archivos::guardar_parte(dir, &nombre, &mut field).await?;
            adjuntos.asignar(&nombre, guardado);
        } else {
            let mut bytes = Vec::new();
            while let Some(chunk) = field.next().await {
                let chunk = chunk?;
                if bytes.len() + chunk.len() > LIMITE_CUERPO {
                    return Err(format!("El campo '{nombre}' excede el límite de 10 MB").into());
                }
                bytes.extend_from_slice(&chunk);
            }
            campos.insert(nombre, String::from_utf8_lossy(&bytes).into_owned());
        }
    }

    Ok((registro_desde_campos(&campos), adjuntos))
}

fn registro_desde_campos(campos: &HashMap<String, String>) -> Registro {
    let campo = |nombre: &str| campos.get(nombre).cloned().unwrap_or_default();
    Registro {
        nombre: campo("nombre"),
        edad: campo("edad"),
        curp: campo("curp"),
        rfc: campo("rfc"),
        nss: campo("nss"),
        telefono: campo("telefono"),
        direccion: campo("direccion"),
        leer_escribir: campo("leer_escribir"),
        discapacidad: campo("discapacidad"),
        experiencia: campo("experiencia"),
        salud: campo("salud"),
        origen: campo("origen"),
        observaciones: campo("observaciones"),
        trabajo_previo: campo("trabajo_previo"),
        anio_trabajo: campo("año_trabajo"),
        area_trabajo: campo("area_trabajo"),
        contacto_emergencia: campo("contacto_emergencia"),
        telefono_emergencia: campo("telefono_emergencia"),
        // Los adjuntos de un envío multipart llegan como partes de
        // archivo, no como campos base64.
        ..Registro::default()
    }
}

/// Arma la fila de 24 columnas en el orden exacto del encabezado del
/// ledger: fecha, los 18 campos del alta y los 5 nombres de adjunto.
pub fn construir_fila(datos: &Registro, adjuntos: &NombresAdjuntos, fecha: &str) -> Vec<String> {
    vec![
        fecha.to_string(),
        datos.nombre.clone(),
        datos.edad.clone(),
        datos.curp.clone(),
        datos.rfc.clone(),
        datos.nss.clone(),
        datos.telefono.clone(),
        datos.direccion.clone(),
        datos.leer_escribir.clone(),
        datos.discapacidad.clone(),
        datos.experiencia.clone(),
        datos.salud.clone(),
        datos.origen.clone(),
        datos.observaciones.clone(),
        datos.trabajo_previo.clone(),
        datos.anio_trabajo.clone(),
        datos.area_trabajo.clone(),
        datos.contacto_emergencia.clone(),
        datos.telefono_emergencia.clone(),
        adjuntos.ine_frente.clone(),
        adjuntos.ine_reverso.clone(),
        adjuntos.curp_archivo.clone(),
        adjuntos.documentos.clone(),
        adjuntos.foto.clone(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Ledger, COLUMNAS};
    use crate::sink::RemoteSink;
    use actix_web::{test, App};
    use async_trait::async_trait;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct SinkOk;

    #[async_trait]
    impl RemoteSink for SinkOk {
        async fn subir(&self, _contenido: &[u8]) -> Result<(), String> {
            Ok(())
        }
    }

    /// Simula un almacén remoto caído.
    struct SinkCaido;

    #[async_trait]
    impl RemoteSink for SinkCaido {
        async fn subir(&self, _contenido: &[u8]) -> Result<(), String> {
            Err("subida: HTTP 503".to_string())
        }
    }

    fn estado(dir: &TempDir, sink: Arc<dyn RemoteSink>) -> web::Data<AppState> {
        let fotos_dir = dir.path().join("fotos");
        fs::create_dir_all(&fotos_dir).unwrap();
        web::Data::new(AppState {
            fotos_dir,
            ledger: Ledger::new(dir.path().join("registros.csv")),
            sink,
        })
    }

    fn leer_ledger(state: &AppState) -> Vec<Vec<String>> {
        let mut lector = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(state.ledger.ruta())
            .unwrap();
        lector
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    macro_rules! app {
        ($estado:expr) => {
            test::init_service(
                App::new()
                    .app_data($estado.clone())
                    .route("/", web::post().to(process)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn alta_json_crea_ledger_fila_y_foto() {
        let dir = tempfile::tempdir().unwrap();
        let estado = estado(&dir, Arc::new(SinkOk));
        let app = app!(estado);

        let foto = format!("data:image/jpeg;base64,{}", STANDARD.encode(b"pixeles"));
        let req = test::TestRequest::post()
            .uri("/")
            .set_json(serde_json::json!({
                "nombre": "Ana",
                "edad": "30",
                "foto_base64": foto,
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert!(resp.status().is_success());
        let cuerpo: Respuesta = test::read_body_json(resp).await;
        assert!(cuerpo.ok);

        let filas = leer_ledger(&estado);
        assert_eq!(filas.len(), 2);
        assert_eq!(filas[0], COLUMNAS.to_vec());

        let fila = &filas[1];
        assert_eq!(fila.len(), 24);
        assert_eq!(fila[1], "Ana");
        assert_eq!(fila[2], "30");
        // Campos no enviados quedan vacíos.
        for columna in &fila[3..19] {
            assert_eq!(columna, "");
        }
        // Slots sin adjunto quedan vacíos; la foto se guardó en disco.
        for columna in &fila[19..23] {
            assert_eq!(columna, "");
        }
        assert!(fila[23].starts_with("foto_"));
        assert!(fila[23].ends_with(".jpg"));
        let bytes = fs::read(estado.fotos_dir.join(&fila[23])).unwrap();
        assert_eq!(bytes, b"pixeles");
    }

    #[actix_web::test]
    async fn dos_altas_identicas_producen_dos_filas() {
        let dir = tempfile::tempdir().unwrap();
        let estado = estado(&dir, Arc::new(SinkOk));
        let app = app!(estado);

        for _ in 0..2 {
            let req = test::TestRequest::post()
                .uri("/")
                .set_json(serde_json::json!({"nombre": "Ana", "edad": "30"}))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert!(resp.status().is_success());
        }

        // Sin deduplicación: mismo contenido, dos filas.
        let filas = leer_ledger(&estado);
        assert_eq!(filas.len(), 3);
        assert_eq!(filas[1][1], "Ana");
        assert_eq!(filas[2][1], "Ana");
    }

    #[actix_web::test]
    async fn fallo_del_sink_no_revierte_la_fila_local() {
        let dir = tempfile::tempdir().unwrap();
        let estado = estado(&dir, Arc::new(SinkCaido));
        let app = app!(estado);

        let req = test::TestRequest::post()
            .uri("/")
            .set_json(serde_json::json!({"nombre": "Ana"}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status().as_u16(), 500);
        let cuerpo: Respuesta = test::read_body_json(resp).await;
        assert!(!cuerpo.ok);
        assert!(cuerpo.error.unwrap().contains("503"));

        // La fila ya estaba escrita antes de intentar la subida.
        let filas = leer_ledger(&estado);
        assert_eq!(filas.len(), 2);
        assert_eq!(filas[1][1], "Ana");
    }

    #[actix_web::test]
    async fn cuerpo_json_demasiado_grande_se_rechaza_sin_fila() {
        let dir = tempfile::tempdir().unwrap();
        let estado = estado(&dir, Arc::new(SinkOk));
        let app = app!(estado);

        let req = test::TestRequest::post()
            .uri("/")
            .set_json(serde_json::json!({
                "nombre": "Ana",
                "observaciones": "x".repeat(LIMITE_CUERPO + 1),
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status().as_u16(), 500);
        let cuerpo: Respuesta = test::read_body_json(resp).await;
        assert!(!cuerpo.ok);
        assert!(cuerpo.error.unwrap().contains("10 MB"));
        // El rechazo ocurre antes de tocar el ledger.
        assert!(!estado.ledger.ruta().exists());
    }

    #[actix_web::test]
    async fn alta_multipart_guarda_el_archivo_en_streaming() {
        let dir = tempfile::tempdir().unwrap();
        let estado = estado(&dir, Arc::new(SinkOk));
        let app = app!(estado);

        let b = "limite-de-prueba";
        let cuerpo = format!(
            "--{b}\r\n\
             Content-Disposition: form-data; name=\"nombre\"\r\n\r\n\
             Luis\r\n\
             --{b}\r\n\
             Content-Disposition: form-data; name=\"foto\"; filename=\"cara.jpg\"\r\n\
             Content-Type: image/jpeg\r\n\r\n\
             pixeles de la cara\r\n\
             --{b}--\r\n"
        );
        let req = test::TestRequest::post()
            .uri("/")
            .insert_header((
                "content-type",
                format!("multipart/form-data; boundary={b}"),
            ))
            .set_payload(cuerpo)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert!(resp.status().is_success());

        let filas = leer_ledger(&estado);
        assert_eq!(filas.len(), 2);
        let fila = &filas[1];
        assert_eq!(fila[1], "Luis");
        assert!(fila[23].starts_with("foto_"));
        assert!(fila[23].ends_with("_cara.jpg"));
        let bytes = fs::read(estado.fotos_dir.join(&fila[23])).unwrap();
        assert_eq!(bytes, b"pixeles de la cara");
    }

    #[::core::prelude::v1::test]
    fn la_fila_respeta_el_orden_del_encabezado() {
        let mut datos = Registro::default();
        datos.nombre = "Ana".to_string();
        datos.anio_trabajo = "2019".to_string();
        datos.telefono_emergencia = "555".to_string();
        let mut adjuntos = NombresAdjuntos::default();
        adjuntos.ine_frente = "ine_frente_20250101120000.jpg".to_string();

        let fila = construir_fila(&datos, &adjuntos, "2025-01-01 12:00:00");

        assert_eq!(fila.len(), COLUMNAS.len());
        assert_eq!(fila[0], "2025-01-01 12:00:00");
        assert_eq!(fila[1], "Ana");
        assert_eq!(fila[15], "2019"); // columna año_trabajo
        assert_eq!(fila[18], "555");
        assert_eq!(fila[19], "ine_frente_20250101120000.jpg");
    }

    #[::core::prelude::v1::test]
    fn campos_ausentes_quedan_vacios() {
        let fila = construir_fila(
            &Registro::default(),
            &NombresAdjuntos::default(),
            "2025-01-01 12:00:00",
        );
        assert!(fila[1..].iter().all(String::is_empty));
    }
}
