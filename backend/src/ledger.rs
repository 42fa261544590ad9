//! El ledger local: un libro CSV con una fila por alta registrada.
//!
//! El archivo es único para todo el proceso. Se crea con la fila de
//! encabezado de 24 columnas la primera vez que se escribe y a partir de
//! ahí solo crece: no hay actualización ni borrado de filas. Cada
//! `append` relee el archivo completo, agrega la fila y lo reescribe.

use std::error::Error;
use std::path::{Path, PathBuf};

/// Encabezado fijo del ledger. El orden de `construir_fila` debe
/// coincidir columna a columna con esta lista.
pub const COLUMNAS: [&str; 24] = [
    "fecha",
    "nombre",
    "edad",
    "curp",
    "rfc",
    "nss",
    "telefono",
    "direccion",
    "leer_escribir",
    "discapacidad",
    "experiencia",
    "salud",
    "origen",
    "observaciones",
    "trabajo_previo",
    "año_trabajo",
    "area_trabajo",
    "contacto_emergencia",
    "telefono_emergencia",
    "ine_frente",
    "ine_reverso",
    "curp_archivo",
    "documentos",
    "foto",
];

#[derive(Debug, Clone)]
pub struct Ledger {
    ruta: PathBuf,
}

impl Ledger {
    pub fn new(ruta: impl Into<PathBuf>) -> Self {
        Self { ruta: ruta.into() }
    }

    pub fn ruta(&self) -> &Path {
        &self.ruta
    }

    /// Agrega una fila al final del libro.
    ///
    /// Si el archivo no existe (o está vacío) se escribe primero el
    /// encabezado. Un archivo ilegible o corrupto es un error fatal para
    /// la petición en curso.
    ///
    /// El ciclo leer-agregar-reescribir no está serializado: dos
    /// peticiones concurrentes pueden pisarse la fila (gana la última en
    /// reescribir).
    pub fn append(&self, fila: &[String]) -> Result<(), Box<dyn Error>> {
        let mut filas = self.cargar()?;

        if filas.is_empty() {
            filas.push(COLUMNAS.iter().map(|c| c.to_string()).collect());
        }
        filas.push(fila.to_vec());

        self.guardar(&filas)
    }

    /// Lee todas las filas del libro, o ninguna si aún no existe.
    fn cargar(&self) -> Result<Vec<Vec<String>>, Box<dyn Error>> {
        let mut filas: Vec<Vec<String>> = Vec::new();
        if self.ruta.exists() {
            let mut lector = csv::ReaderBuilder::new()
                .has_headers(false)
                .from_path(&self.ruta)?;
            for registro in lector.records() {
                let registro = registro?;
                filas.push(registro.iter().map(str::to_string).collect());
            }
        }
        Ok(filas)
    }

    /// Reescribe el archivo completo con las filas dadas.
    fn guardar(&self, filas: &[Vec<String>]) -> Result<(), Box<dyn Error>> {
        let mut escritor = csv::Writer::from_path(&self.ruta)?;
        for f in filas {
            escritor.write_record(f)?;
        }
        escritor.flush()?;
        Ok(())
    }
}
