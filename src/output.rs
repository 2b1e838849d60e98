//! Row output: CSV by default, a padded table on request. A tag, when set,
//! prefixes every data row (and headers get a literal `tag` column).

use std::io::{self, Write};

enum Sink<W: Write> {
    Csv(csv::Writer<W>),
    Table(W),
}

pub struct RecordWriter<W: Write> {
    sink: Sink<W>,
    width: usize,
    tag: Option<String>,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(writer: W, table: bool, width: usize, tag: Option<String>) -> Self {
        let sink = if table {
            Sink::Table(writer)
        } else {
            Sink::Csv(csv::Writer::from_writer(writer))
        };
        RecordWriter { sink, width, tag }
    }

    pub fn write_header(&mut self, headers: &[String]) -> io::Result<()> {
        self.write_prefixed(headers, "tag")
    }

    pub fn write_row(&mut self, row: &[String]) -> io::Result<()> {
        let tag = self.tag.clone();
        self.write_prefixed(row, tag.as_deref().unwrap_or_default())
    }

    fn write_prefixed(&mut self, row: &[String], prefix: &str) -> io::Result<()> {
        let mut fields: Vec<&str> = Vec::with_capacity(row.len() + 1);
        if self.tag.is_some() {
            fields.push(prefix);
        }
        fields.extend(row.iter().map(String::as_str));
        match &mut self.sink {
            Sink::Csv(writer) => writer
                .write_record(&fields)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e)),
            Sink::Table(writer) => {
                let mut line = String::new();
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        line.push_str(" | ");
                    }
                    line.push_str(&format!("{:>width$}", field, width = self.width));
                }
                line.push('\n');
                writer.write_all(line.as_bytes())
            }
        }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        match &mut self.sink {
            Sink::Csv(writer) => writer.flush(),
            Sink::Table(writer) => writer.flush(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn csv_rows() {
        let mut out = RecordWriter::new(Vec::new(), false, 10, None);
        out.write_row(&row(&["a", "b"])).unwrap();
        out.write_row(&row(&["1", "2"])).unwrap();
        out.flush().unwrap();
        let bytes = match out.sink {
            Sink::Csv(w) => w.into_inner().unwrap(),
            _ => unreachable!(),
        };
        assert_eq!(String::from_utf8(bytes).unwrap(), "a,b\n1,2\n");
    }

    #[test]
    fn tag_prefixes_rows_and_headers() {
        let mut out = RecordWriter::new(Vec::new(), false, 10, Some("run7".to_string()));
        out.write_header(&row(&["name"])).unwrap();
        out.write_row(&row(&["alice"])).unwrap();
        out.flush().unwrap();
        let bytes = match out.sink {
            Sink::Csv(w) => w.into_inner().unwrap(),
            _ => unreachable!(),
        };
        assert_eq!(String::from_utf8(bytes).unwrap(), "tag,name\nrun7,alice\n");
    }

    #[test]
    fn table_pads_to_width() {
        let mut out = RecordWriter::new(Vec::new(), true, 4, None);
        out.write_row(&row(&["a", "bb"])).unwrap();
        let bytes = match out.sink {
            Sink::Table(w) => w,
            _ => unreachable!(),
        };
        assert_eq!(String::from_utf8(bytes).unwrap(), "   a |   bb\n");
    }
}
