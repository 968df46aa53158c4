pub mod convert;
pub mod inspect;

use std::fs::File;
use std::io::{self, BufRead, BufReader};

use aon_convert::error::ConvertError;

fn open_input(path: Option<&str>) -> Result<Box<dyn BufRead>, ConvertError> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .map_err(|e| ConvertError::Config(format!("cannot open input {path}: {e}")))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(io::stdin().lock())),
    }
}
