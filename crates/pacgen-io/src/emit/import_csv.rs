//! PME variable-import file (`<project>_Rvars.csv`)
//!
//! Every register gets a row built from a fixed template; only the name,
//! data type, description, initial value and I/O address differ.

use anyhow::Result;
use std::io::Write;

use crate::session::RegisterVar;

/// Column header expected by PME `Variables → Import…`
pub const IMPORT_HEADER: [&str; 23] = [
    "Name",
    "DataType",
    "Description",
    "DataTypeID",
    "Retentive",
    "Force2",
    "DisplayFormat",
    "ArrayDimension1",
    "ArrayDimension2",
    "Publish",
    "MarkAsUsed",
    "MaxLength",
    "InitialValue",
    "DataSource",
    "DataSourceClsid",
    "IOAddress",
    "IOAddressOffset",
    "IOAddressAlias",
    "Input_VTL",
    "Output_VTL",
    "DisplayName",
    "OPCAccessLevel",
    "extra_properties",
];

/// Default cell values, aligned with `IMPORT_HEADER`
const IMPORT_TEMPLATE: [&str; 23] = [
    "",
    "WORD",
    "",
    "",
    "YES",
    "",
    "Decimal",
    "0",
    "0",
    "External Read/Write",
    "NO",
    "16",
    "0",
    "Controller",
    "{98D70480-4881-11D4-9F26-0050DA19DE4A}",
    "",
    "",
    "",
    "",
    "",
    "",
    "Private",
    "",
];

const COL_NAME: usize = 0;
const COL_DATA_TYPE: usize = 1;
const COL_DESCRIPTION: usize = 2;
const COL_INITIAL_VALUE: usize = 12;
const COL_IO_ADDRESS: usize = 15;

/// Write the import file for `registers` (expected in symbol order)
pub fn write_import_csv<'a, W, I>(writer: W, registers: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a RegisterVar>,
{
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(IMPORT_HEADER)?;

    for var in registers {
        writer.write_record(import_record(var))?;
    }

    writer.flush()?;
    Ok(())
}

fn import_record(var: &RegisterVar) -> Vec<String> {
    let mut row: Vec<String> = IMPORT_TEMPLATE.iter().map(|cell| cell.to_string()).collect();
    row[COL_NAME] = var.symbol.clone();
    row[COL_DATA_TYPE] = var.data_type.register_type().as_str().to_string();
    row[COL_DESCRIPTION] = format!("mirror of {}", var.tag_symbol);
    row[COL_INITIAL_VALUE] = var.initial_value.clone();
    row[COL_IO_ADDRESS] = var.address.clone();
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::DataType;

    fn var(symbol: &str, data_type: DataType, initial_value: &str) -> RegisterVar {
        RegisterVar {
            symbol: symbol.to_string(),
            address: format!("%{symbol}"),
            tag_symbol: "START_PB".to_string(),
            data_type,
            initial_value: initial_value.to_string(),
        }
    }

    #[test]
    fn test_import_record() {
        let row = import_record(&var("R01019", DataType::Bool, "1"));
        assert_eq!(row.len(), IMPORT_HEADER.len());
        assert_eq!(row[0], "R01019");
        assert_eq!(row[1], "WORD");
        assert_eq!(row[2], "mirror of START_PB");
        assert_eq!(row[4], "YES");
        assert_eq!(row[12], "1");
        assert_eq!(row[14], "{98D70480-4881-11D4-9F26-0050DA19DE4A}");
        assert_eq!(row[15], "%R01019");
    }

    #[test]
    fn test_data_type_collapse() {
        assert_eq!(import_record(&var("R1", DataType::Int, "0"))[1], "INT");
        assert_eq!(import_record(&var("R1", DataType::String, "0"))[1], "STRING");
        assert_eq!(import_record(&var("R1", DataType::Word, "0"))[1], "WORD");
    }

    #[test]
    fn test_write_import_csv() {
        let vars = [var("R00001", DataType::Int, "5"), var("R00002", DataType::Bool, "0")];
        let mut buf = Vec::new();
        write_import_csv(&mut buf, &vars).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let mut reader = csv::Reader::from_reader(text.as_bytes());

        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), IMPORT_HEADER.to_vec());

        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(&records[0][0], "R00001");
        assert_eq!(&records[0][1], "INT");
        assert_eq!(&records[1][15], "%R00002");
        assert_eq!(&records[1][9], "External Read/Write");
    }
}
