use super::commit::WriteError;
use super::report::Stage;
use crate::convert::{ConversionError, ConversionKind};
use crate::naming::NameError;
use crate::template::TemplateError;
use thiserror::Error;

/// Why a single row failed
///
/// Caught at the row boundary and recorded as a
/// [`JobResult::Failure`](super::JobResult::Failure); never aborts the batch.
#[derive(Error, Debug)]
pub enum JobError {
    #[error("{0}")]
    Render(#[from] TemplateError),

    #[error("{0}")]
    NameResolution(#[from] NameError),

    #[error("{0}")]
    Conversion(#[from] ConversionError),

    #[error("{0}")]
    Write(#[from] WriteError),
}

impl JobError {
    pub fn stage(&self) -> Stage {
        match self {
            JobError::Render(_) => Stage::Render,
            JobError::NameResolution(_) => Stage::NameResolution,
            JobError::Conversion(e) => match e.kind {
                ConversionKind::Pdf => Stage::PdfConversion,
                ConversionKind::Docx => Stage::DocxConversion,
            },
            JobError::Write(_) => Stage::Write,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_mapping() {
        let err = JobError::from(ConversionError::docx("bad image"));
        assert_eq!(err.stage(), Stage::DocxConversion);
        assert_eq!(err.to_string(), "docx conversion failed: bad image");

        let err = JobError::from(TemplateError::MissingRequiredField {
            field: "amount".to_string(),
            line: 3,
        });
        assert_eq!(err.stage(), Stage::Render);
    }
}
