//! CSV text output.
//!
//! One file per period and family: the regular family holds keys without
//! soil layers, the soil family the layered keys. Each row starts with the
//! simulation year and, except for yearly files, the day, week or month.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::WriterBuilder;
use log::debug;

use crate::config::OutputSetup;
use crate::constants::{NAME_SEP, N_PERIODS, OUTSEP, OUT_DIGITS, REGULAR_FILES, ROW_CAPACITY, SOIL_FILES};
use crate::error::OutputError;
use crate::keys::OutKey;
use crate::period::OutPeriod;
use crate::registry::Registry;

use super::{RowLeader, Sink};

/// Text file family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFamily {
    Regular,
    Soil,
}

impl FileFamily {
    pub const ALL: [FileFamily; 2] = [FileFamily::Regular, FileFamily::Soil];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn of(key: OutKey) -> Self {
        if key.has_soil_layers() {
            FileFamily::Soil
        } else {
            FileFamily::Regular
        }
    }

    /// Default file name for `period`.
    pub fn file_name(self, period: OutPeriod) -> &'static str {
        match self {
            FileFamily::Regular => REGULAR_FILES[period.index()],
            FileFamily::Soil => SOIL_FILES[period.index()],
        }
    }
}

/// Fields of one pending row, with a byte budget.
#[derive(Debug, Clone, Default)]
struct RowBuffer {
    fields: Vec<String>,
    bytes: usize,
}

impl RowBuffer {
    fn clear(&mut self) {
        self.fields.clear();
        self.bytes = 0;
    }

    fn push(&mut self, field: String, capacity: usize) -> Result<(), OutputError> {
        let needed = self.bytes + field.len() + 1;
        if needed > capacity {
            return Err(OutputError::Capacity { needed, capacity });
        }
        self.bytes = needed;
        self.fields.push(field);
        Ok(())
    }
}

type WriterGrid<W> = [[Option<csv::Writer<W>>; 2]; N_PERIODS];

pub struct TextSink<W: Write> {
    writers: WriterGrid<W>,
    rows: [[RowBuffer; 2]; N_PERIODS],
    row_capacity: usize,
}

impl<W: Write> std::fmt::Debug for TextSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let open: Vec<(OutPeriod, FileFamily)> = OutPeriod::ALL
            .into_iter()
            .flat_map(|p| FileFamily::ALL.into_iter().map(move |fam| (p, fam)))
            .filter(|(p, fam)| self.writers[p.index()][fam.index()].is_some())
            .collect();
        f.debug_struct("TextSink")
            .field("open", &open)
            .field("row_capacity", &self.row_capacity)
            .finish()
    }
}

impl TextSink<File> {
    /// Create the CSV files needed by `setup` inside `dir` and write their
    /// headers.
    pub fn create<P: AsRef<Path>>(
        dir: P,
        setup: &OutputSetup,
        registry: &Registry,
    ) -> Result<Self, OutputError> {
        let dir = dir.as_ref();
        let mut files: [[Option<File>; 2]; N_PERIODS] = Default::default();
        for p in OutPeriod::ALL {
            for fam in FileFamily::ALL {
                let needed = match fam {
                    FileFamily::Regular => setup.make_regular(p),
                    FileFamily::Soil => setup.make_soil(p),
                };
                if needed {
                    let path = dir.join(fam.file_name(p));
                    debug!("creating {}", path.display());
                    files[p.index()][fam.index()] = Some(File::create(path)?);
                }
            }
        }
        Self::from_writers(files, setup, registry)
    }
}

impl<W: Write> TextSink<W> {
    /// Wrap already opened writers, indexed by period then family, and
    /// write their headers.
    pub fn from_writers(
        writers: [[Option<W>; 2]; N_PERIODS],
        setup: &OutputSetup,
        registry: &Registry,
    ) -> Result<Self, OutputError> {
        let mut grid: WriterGrid<W> = Default::default();
        for (p, per_period) in writers.into_iter().enumerate() {
            for (f, w) in per_period.into_iter().enumerate() {
                grid[p][f] = w.map(|w| {
                    WriterBuilder::new()
                        .delimiter(OUTSEP)
                        .has_headers(false)
                        .flexible(true)
                        .from_writer(w)
                });
            }
        }
        let mut sink = Self {
            writers: grid,
            rows: Default::default(),
            row_capacity: ROW_CAPACITY,
        };
        sink.write_headers(setup, registry)?;
        Ok(sink)
    }

    /// Override the per-row byte capacity.
    pub fn with_row_capacity(mut self, capacity: usize) -> Self {
        self.row_capacity = capacity;
        self
    }

    fn write_headers(&mut self, setup: &OutputSetup, registry: &Registry) -> Result<(), OutputError> {
        for p in OutPeriod::ALL {
            for fam in FileFamily::ALL {
                let Some(w) = self.writers[p.index()][fam.index()].as_mut() else {
                    continue;
                };
                w.write_record(&header(p, fam, setup, registry))?;
            }
        }
        Ok(())
    }

    /// Underlying writer of (period, family), flushed.
    pub fn get_ref(&mut self, period: OutPeriod, family: FileFamily) -> Result<Option<&W>, OutputError> {
        match self.writers[period.index()][family.index()].as_mut() {
            Some(w) => {
                w.flush()?;
                Ok(Some(w.get_ref()))
            }
            None => Ok(None),
        }
    }

    pub fn flush(&mut self) -> Result<(), OutputError> {
        for w in self.writers.iter_mut().flatten().flatten() {
            w.flush()?;
        }
        Ok(())
    }
}

/// Header fields of one file: `Year`, the sub-unit name, then
/// `<KEY>_<col>` for every active key of the family writing `period`.
pub fn header(period: OutPeriod, family: FileFamily, setup: &OutputSetup, registry: &Registry) -> Vec<String> {
    let mut fields = vec![OutPeriod::Year.long_name().to_string()];
    if period != OutPeriod::Year {
        fields.push(period.long_name().to_string());
    }
    for cfg in setup.active_keys() {
        if FileFamily::of(cfg.key) != family || !cfg.subscribes(period) {
            continue;
        }
        fields.extend(
            registry
                .colnames(cfg.key)
                .iter()
                .map(|c| format!("{}{}{}", cfg.key.name(), NAME_SEP, c)),
        );
    }
    fields
}

impl<W: Write> Sink for TextSink<W> {
    fn begin_row(&mut self, period: OutPeriod, leader: RowLeader) -> Result<(), OutputError> {
        let capacity = self.row_capacity;
        for fam in FileFamily::ALL {
            let row = &mut self.rows[period.index()][fam.index()];
            row.clear();
            row.push(leader.simyear.to_string(), capacity)?;
            if let Some(sub) = leader.subunit {
                row.push(sub.to_string(), capacity)?;
            }
        }
        Ok(())
    }

    fn write_key(
        &mut self,
        key: OutKey,
        period: OutPeriod,
        _leader: RowLeader,
        values: &[f64],
    ) -> Result<(), OutputError> {
        let fam = FileFamily::of(key);
        if self.writers[period.index()][fam.index()].is_none() {
            return Ok(());
        }
        let capacity = self.row_capacity;
        let row = &mut self.rows[period.index()][fam.index()];
        for v in values {
            row.push(format!("{:.*}", OUT_DIGITS, v), capacity)?;
        }
        Ok(())
    }

    fn end_row(&mut self, period: OutPeriod) -> Result<(), OutputError> {
        for fam in FileFamily::ALL {
            let row = &mut self.rows[period.index()][fam.index()];
            if let Some(w) = self.writers[period.index()][fam.index()].as_mut() {
                w.write_record(&row.fields)?;
            }
            row.clear();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Diagnostics;
    use crate::period::OutSum;
    use crate::registry::SiteDims;

    fn setup() -> (OutputSetup, Registry) {
        let mut setup = OutputSetup::new();
        let mut diags = Diagnostics::new();
        setup
            .enable(OutKey::SoilInf, OutSum::Sum, &[OutPeriod::Month], 1, 366, false, &mut diags)
            .unwrap();
        setup
            .enable(OutKey::SnowPack, OutSum::Average, &[OutPeriod::Month], 1, 366, false, &mut diags)
            .unwrap();
        setup
            .enable(OutKey::VWCBulk, OutSum::Average, &[OutPeriod::Month], 1, 366, false, &mut diags)
            .unwrap();
        (setup, Registry::new(SiteDims::new(2, 1, vec![]).unwrap()))
    }

    fn month_writers() -> [[Option<Vec<u8>>; 2]; N_PERIODS] {
        let mut w: [[Option<Vec<u8>>; 2]; N_PERIODS] = Default::default();
        w[OutPeriod::Month.index()] = [Some(Vec::new()), Some(Vec::new())];
        w
    }

    fn text(sink: &mut TextSink<Vec<u8>>, family: FileFamily) -> String {
        let bytes = sink.get_ref(OutPeriod::Month, family).unwrap().unwrap();
        String::from_utf8(bytes.clone()).unwrap()
    }

    #[test]
    fn headers_split_by_family() {
        let (setup, registry) = setup();
        assert_eq!(
            header(OutPeriod::Month, FileFamily::Regular, &setup, &registry),
            vec![
                "Year",
                "Month",
                "SOILINFILT_soil_inf",
                "SNOWPACK_snowpackWaterEquivalent_cm",
                "SNOWPACK_snowdepth_cm",
            ]
        );
        assert_eq!(
            header(OutPeriod::Year, FileFamily::Soil, &setup, &registry),
            vec!["Year"]
        );
        assert_eq!(
            FileFamily::Soil.file_name(OutPeriod::Day),
            "sw2_daily_slyrs.csv"
        );
    }

    #[test]
    fn rows_are_written_to_their_family() {
        let (setup, registry) = setup();
        let mut sink = TextSink::from_writers(month_writers(), &setup, &registry).unwrap();
        let leader = RowLeader {
            simyear: 1980,
            subunit: Some(1),
        };
        sink.begin_row(OutPeriod::Month, leader).unwrap();
        sink.write_key(OutKey::SoilInf, OutPeriod::Month, leader, &[1.5])
            .unwrap();
        sink.write_key(OutKey::SnowPack, OutPeriod::Month, leader, &[0.0, 2.25])
            .unwrap();
        sink.write_key(OutKey::VWCBulk, OutPeriod::Month, leader, &[0.1, 0.2])
            .unwrap();
        sink.end_row(OutPeriod::Month).unwrap();

        let regular = text(&mut sink, FileFamily::Regular);
        let lines: Vec<&str> = regular.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "1980,1,1.500000,0.000000,2.250000");

        let soil = text(&mut sink, FileFamily::Soil);
        assert_eq!(
            soil.lines().collect::<Vec<_>>(),
            vec!["Year,Month,VWCBULK_Lyr_1,VWCBULK_Lyr_2", "1980,1,0.100000,0.200000"]
        );
    }

    #[test]
    fn row_overflow_is_a_capacity_error() {
        let (setup, registry) = setup();
        let mut sink = TextSink::from_writers(month_writers(), &setup, &registry)
            .unwrap()
            .with_row_capacity(16);
        let leader = RowLeader {
            simyear: 1980,
            subunit: Some(1),
        };
        sink.begin_row(OutPeriod::Month, leader).unwrap();
        let err = sink
            .write_key(OutKey::SnowPack, OutPeriod::Month, leader, &[1.0, 2.0])
            .unwrap_err();
        assert!(matches!(err, OutputError::Capacity { capacity: 16, .. }));
    }

    #[test]
    fn unopened_files_are_skipped() {
        let (setup, registry) = setup();
        let mut sink: TextSink<Vec<u8>> =
            TextSink::from_writers(Default::default(), &setup, &registry).unwrap();
        let leader = RowLeader {
            simyear: 1980,
            subunit: None,
        };
        sink.begin_row(OutPeriod::Year, leader).unwrap();
        sink.write_key(OutKey::SoilInf, OutPeriod::Year, leader, &[1.0])
            .unwrap();
        sink.end_row(OutPeriod::Year).unwrap();
        assert!(sink.get_ref(OutPeriod::Year, FileFamily::Regular).unwrap().is_none());
    }
}
