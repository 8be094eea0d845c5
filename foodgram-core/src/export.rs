//! CSV rendering of an aggregated shopping list.

use crate::shopping_list::AggregatedLine;

pub const SHOPPING_LIST_FILENAME: &str = "shopping_list.csv";
pub const SHOPPING_LIST_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// A rendered shopping list ready to be sent as a file attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListExport {
    pub content_type: &'static str,
    pub filename: &'static str,
    pub body: Vec<u8>,
}

impl ShoppingListExport {
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

/// Render lines as `name,unit,total` rows with no header row.
///
/// Fields are quoted only when they contain a comma, a quote or a line
/// break. Rows end with CRLF.
pub fn render_shopping_list(lines: &[AggregatedLine]) -> Result<ShoppingListExport, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());

    for line in lines {
        let total = line.total_amount.to_string();
        writer.write_record([
            line.name.as_str(),
            line.measurement_unit.as_str(),
            total.as_str(),
        ])?;
    }

    let body = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;

    Ok(ShoppingListExport {
        content_type: SHOPPING_LIST_CONTENT_TYPE,
        filename: SHOPPING_LIST_FILENAME,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, unit: &str, total_amount: u64) -> AggregatedLine {
        AggregatedLine {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            total_amount,
        }
    }

    fn render(lines: &[AggregatedLine]) -> String {
        String::from_utf8(render_shopping_list(lines).unwrap().body).unwrap()
    }

    #[test]
    fn test_empty_list_renders_nothing() {
        let export = render_shopping_list(&[]).unwrap();
        assert!(export.body.is_empty());
        assert_eq!(export.filename, "shopping_list.csv");
        assert_eq!(export.content_type, "text/csv; charset=utf-8");
    }

    #[test]
    fn test_plain_fields_are_unquoted() {
        assert_eq!(render(&[line("Flour", "g", 300)]), "Flour,g,300\r\n");
    }

    #[test]
    fn test_large_totals_have_no_separators() {
        assert_eq!(
            render(&[line("rice", "g", 1_250_000)]),
            "rice,g,1250000\r\n"
        );
    }

    #[test]
    fn test_special_characters_are_quoted() {
        assert_eq!(
            render(&[
                line("salt, coarse", "g", 5),
                line("\"fancy\" oil", "ml", 10),
                line("multi\nline", "pcs", 1),
            ]),
            "\"salt, coarse\",g,5\r\n\"\"\"fancy\"\" oil\",ml,10\r\n\"multi\nline\",pcs,1\r\n"
        );
    }

    #[test]
    fn test_non_ascii_passes_through() {
        assert_eq!(render(&[line("мука", "г", 500)]), "мука,г,500\r\n");
    }

    #[test]
    fn test_content_disposition() {
        let export = render_shopping_list(&[]).unwrap();
        assert_eq!(
            export.content_disposition(),
            "attachment; filename=\"shopping_list.csv\""
        );
    }
}
