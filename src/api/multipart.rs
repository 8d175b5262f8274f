use std::collections::HashMap;

use actix_multipart::{Field, Multipart};
use futures::StreamExt;

use crate::domain::validation::FormFields;
use crate::infrastructure::uploads::{too_large, UploadStore, MAX_UPLOAD_BYTES};
use crate::utils::errors::ApiError;

const MAX_TEXT_FIELD_BYTES: usize = 16 * 1024;

/// A parsed `multipart/form-data` body: text fields plus the public paths of stored files.
#[derive(Debug, Default)]
pub struct FormData {
    pub fields: FormFields,
    files: HashMap<String, Vec<String>>,
}

impl FormData {
    /// Reads the whole form. `file_fields` names the accepted file inputs with
    /// the maximum number of files each one takes; files are stored as they
    /// arrive and removed again if the form turns out to be invalid.
    pub async fn parse(
        payload: Multipart,
        uploads: &UploadStore,
        file_fields: &[(&str, usize)],
    ) -> Result<FormData, ApiError> {
        let mut form = FormData::default();
        match form.read(payload, uploads, file_fields).await {
            Ok(()) => Ok(form),
            Err(e) => {
                form.discard(uploads).await;
                Err(e)
            }
        }
    }

    pub fn files(&self, name: &str) -> &[String] {
        self.files.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn file(&self, name: &str) -> Option<&String> {
        self.files(name).first()
    }

    /// Removes every stored file; used when the request fails after parsing.
    pub async fn discard(&self, uploads: &UploadStore) {
        for path in self.files.values().flatten() {
            uploads.remove(path).await;
        }
    }

    async fn read(
        &mut self,
        mut payload: Multipart,
        uploads: &UploadStore,
        file_fields: &[(&str, usize)],
    ) -> Result<(), ApiError> {
        while let Some(item) = payload.next().await {
            let mut field = item.map_err(malformed)?;

            let (name, filename) = match field.content_disposition() {
                Some(disposition) => (
                    disposition.get_name().unwrap_or_default().to_string(),
                    disposition.get_filename().map(str::to_string),
                ),
                None => (String::new(), None),
            };

            match filename {
                None => {
                    let bytes = read_field(&mut field, MAX_TEXT_FIELD_BYTES, || {
                        ApiError::BadRequest(format!("El campo {} es demasiado largo", name))
                    })
                    .await?;
                    let value = String::from_utf8(bytes)
                        .map_err(|_| ApiError::BadRequest(format!("El campo {} no es texto válido", name)))?;
                    self.fields.insert(name, value);
                }
                // Browsers send an empty file part when nothing was selected.
                Some(filename) if filename.is_empty() => {
                    read_field(&mut field, MAX_UPLOAD_BYTES, too_large).await?;
                }
                Some(filename) => {
                    let Some(&(_, max_files)) = file_fields.iter().find(|(allowed, _)| *allowed == name) else {
                        return Err(ApiError::BadRequest(format!("Campo de archivo inesperado: {}", name)));
                    };
                    if self.files(&name).len() >= max_files {
                        return Err(ApiError::BadRequest(format!(
                            "Se permiten como máximo {} archivos en {}",
                            max_files, name
                        )));
                    }

                    UploadStore::image_extension(&filename)?;
                    let bytes = read_field(&mut field, MAX_UPLOAD_BYTES, too_large).await?;
                    let path = uploads.save(&filename, &bytes).await?;
                    self.files.entry(name).or_default().push(path);
                }
            }
        }
        Ok(())
    }
}

async fn read_field<F>(field: &mut Field, limit: usize, too_big: F) -> Result<Vec<u8>, ApiError>
where
    F: Fn() -> ApiError,
{
    let mut data = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(malformed)?;
        if data.len() + chunk.len() > limit {
            return Err(too_big());
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

fn malformed(error: actix_multipart::MultipartError) -> ApiError {
    ApiError::BadRequest(format!("Formulario inválido: {}", error))
}
