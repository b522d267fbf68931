use quick_xml::de::from_str;

use super::kernel::xml_part;
use super::records::XlsxTable;
use crate::{ImportError, XlsxFiles};

pub fn extract_table(files: &XlsxFiles, path: &str) -> Result<XlsxTable, ImportError> {
    let xml = xml_part(files, path)?;
    from_str(xml).map_err(|err| ImportError::XmlDe {
        part: path.to_string(),
        message: err.to_string(),
    })
}
