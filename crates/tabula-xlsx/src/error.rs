use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("missing xlsx part: {0}")]
    MissingPart(String),
    #[error("xml error in {part}: {source}")]
    Xml {
        part: String,
        #[source]
        source: roxmltree::Error,
    },
    #[error("xml error in {part}: {message}")]
    XmlDe { part: String, message: String },
    #[error("missing required attribute `{attribute}` on <{element}> in {part}")]
    MissingRequired {
        part: String,
        element: String,
        attribute: String,
    },
    #[error("invalid reference `{reference}` in {part}")]
    InvalidReference { part: String, reference: String },
    #[error("part {0} is not an xml part")]
    NotXml(String),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cell {sheet}!{xc} references unknown {kind} id {id}")]
    UnknownId {
        sheet: String,
        xc: String,
        kind: &'static str,
        id: u32,
    },
    #[error("invalid reference `{0}`")]
    InvalidReference(String),
    #[error("failed to serialize {part}: {message}")]
    Serialize { part: String, message: String },
}
