//! Output configuration and the setup file parser.
//!
//! The setup file lists one output key per line:
//!
//! ```text
//! # key       sumtype  period  first  last  outfile
//! TIMESTEP    dy mo yr
//! TEMP        AVG      YR      1      end   temp
//! PRECIP      SUM      MO      1      end   precip
//! ```
//!
//! A `TIMESTEP` line overrides the period column of every key that follows
//! it. `#` starts a comment.

use std::path::Path;

use log::debug;
use smallvec::SmallVec;

use crate::constants::{MAX_DOY, N_PERIODS};
use crate::error::{Diagnostics, OutputError};
use crate::keys::OutKey;
use crate::period::{OutPeriod, OutSum};

/// Periods requested for one key.
pub type PeriodList = SmallVec<[OutPeriod; N_PERIODS]>;

/// Configuration of one output key.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyConfig {
    pub key: OutKey,
    pub active: bool,
    pub sumtype: OutSum,
    pub periods: PeriodList,
    /// Day-of-year bounds as read from the setup.
    pub first_orig: u32,
    pub last_orig: u32,
    /// Bounds clamped to the current simulation year.
    pub first: u32,
    pub last: u32,
    pub has_soil_layers: bool,
    pub outfile: String,
}

impl KeyConfig {
    fn off(key: OutKey) -> Self {
        Self {
            key,
            active: false,
            sumtype: OutSum::Off,
            periods: PeriodList::new(),
            first_orig: 1,
            last_orig: MAX_DOY,
            first: 1,
            last: MAX_DOY,
            has_soil_layers: key.has_soil_layers(),
            outfile: String::new(),
        }
    }

    /// Returns `true` if the key is active and writes `period`.
    pub fn subscribes(&self, period: OutPeriod) -> bool {
        self.active && self.periods.contains(&period)
    }

    /// Returns `true` if a period index lies inside the clamped bounds.
    pub fn in_bounds(&self, index: u32) -> bool {
        index >= self.first && index <= self.last
    }
}

/// Output configuration of every key.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSetup {
    keys: Vec<KeyConfig>,
}

impl Default for OutputSetup {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSetup {
    /// Setup with every key switched off.
    pub fn new() -> Self {
        Self {
            keys: OutKey::ALL.iter().map(|&k| KeyConfig::off(k)).collect(),
        }
    }

    /// Parse a setup file's text. `deep_drain` tells whether the site
    /// simulates deep drainage.
    pub fn parse(text: &str, deep_drain: bool) -> Result<(Self, Diagnostics), OutputError> {
        let mut setup = Self::new();
        let mut diags = Diagnostics::new();
        let mut timestep: Option<PeriodList> = None;

        for (lineno, raw) in text.lines().enumerate() {
            let line_no = lineno + 1;
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            let head = fields[0];

            if head.eq_ignore_ascii_case("TIMESTEP") {
                let requested = &fields[1..];
                if requested.len() > N_PERIODS {
                    return Err(OutputError::Config {
                        line: line_no,
                        message: format!(
                            "TIMESTEP lists {} periods, at most {} are allowed",
                            requested.len(),
                            N_PERIODS
                        ),
                    });
                }
                if !requested.is_empty() {
                    let periods = requested
                        .iter()
                        .map(|p| OutPeriod::parse(p))
                        .collect::<Result<PeriodList, _>>()?;
                    timestep = Some(periods);
                }
                continue;
            }

            if head.eq_ignore_ascii_case("OUTSEP") {
                diags.warn(format!(
                    "line {}: OUTSEP is no longer supported, output is always comma separated",
                    line_no
                ));
                continue;
            }

            if fields.len() < 6 {
                return Err(OutputError::Config {
                    line: line_no,
                    message: format!("insufficient input for key {}", head),
                });
            }

            let key = OutKey::parse(head)?;
            let sumtype = OutSum::parse(fields[1])?;
            let first: u32 = fields[3].parse().map_err(|_| OutputError::Config {
                line: line_no,
                message: format!("invalid first day '{}' for key {}", fields[3], key),
            })?;
            let last: u32 = if fields[4].eq_ignore_ascii_case("END") {
                MAX_DOY
            } else {
                fields[4].parse().map_err(|_| OutputError::Config {
                    line: line_no,
                    message: format!("invalid last day '{}' for key {}", fields[4], key),
                })?
            };

            let periods = match &timestep {
                Some(p) => p.clone(),
                None => {
                    let mut p = PeriodList::new();
                    p.push(OutPeriod::parse(fields[2])?);
                    p
                }
            };

            setup
                .configure(key, sumtype, periods, first, last, deep_drain, &mut diags)
                .map_err(|message| OutputError::Config {
                    line: line_no,
                    message,
                })?;
            setup.keys[key.index()].outfile = fields[5].to_string();
        }

        debug!(
            "output setup: {} active keys, periods in use {:?}",
            setup.active_keys().count(),
            setup.periods_in_use()
        );
        Ok((setup, diags))
    }

    /// Read and parse a setup file.
    pub fn from_file(
        path: impl AsRef<Path>,
        deep_drain: bool,
    ) -> Result<(Self, Diagnostics), OutputError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text, deep_drain)
    }

    /// Configure one key programmatically, with the same checks as the
    /// parser.
    #[allow(clippy::too_many_arguments)]
    pub fn enable(
        &mut self,
        key: OutKey,
        sumtype: OutSum,
        periods: &[OutPeriod],
        first: u32,
        last: u32,
        deep_drain: bool,
        diags: &mut Diagnostics,
    ) -> Result<(), OutputError> {
        if periods.len() > N_PERIODS {
            return Err(OutputError::Invalid(format!(
                "{} periods requested for {}, at most {} are allowed",
                periods.len(),
                key,
                N_PERIODS
            )));
        }
        self.configure(
            key,
            sumtype,
            periods.iter().copied().collect(),
            first,
            last,
            deep_drain,
            diags,
        )
        .map_err(OutputError::Invalid)
    }

    #[allow(clippy::too_many_arguments)]
    fn configure(
        &mut self,
        key: OutKey,
        mut sumtype: OutSum,
        periods: PeriodList,
        mut first: u32,
        mut last: u32,
        deep_drain: bool,
        diags: &mut Diagnostics,
    ) -> Result<(), String> {
        let cfg = &mut self.keys[key.index()];
        *cfg = KeyConfig::off(key);

        if sumtype == OutSum::Off {
            return Ok(());
        }

        if sumtype == OutSum::FinalValue && !cfg.has_soil_layers {
            diags.warn(format!(
                "summary type FIN with key {} is meaningless, using AVG instead",
                key
            ));
            sumtype = OutSum::Average;
        }

        if key == OutKey::Estab {
            sumtype = OutSum::Sum;
            first = 1;
            last = MAX_DOY;
        } else if key.is_marker() {
            diags.warn(format!("output key {} is currently unimplemented", key));
            return Ok(());
        }

        if key == OutKey::DeepSWC && !deep_drain {
            diags.warn(format!(
                "{} cannot produce output if deep drainage is not simulated",
                key
            ));
            return Ok(());
        }

        if last == 0 {
            return Err(format!("invalid ending day ({}), key={}", last, key));
        }

        cfg.active = true;
        cfg.sumtype = sumtype;
        cfg.periods = periods;
        cfg.first_orig = first;
        cfg.last_orig = last;
        cfg.first = first;
        cfg.last = last;
        Ok(())
    }

    pub fn key(&self, key: OutKey) -> &KeyConfig {
        &self.keys[key.index()]
    }

    /// All key configurations in table order.
    pub fn keys(&self) -> &[KeyConfig] {
        &self.keys
    }

    pub fn active_keys(&self) -> impl Iterator<Item = &KeyConfig> {
        self.keys.iter().filter(|k| k.active)
    }

    /// Clamp every key's bounds to the simulated days of a new year.
    pub fn new_year(&mut self, firstdoy: u32, lastdoy: u32) {
        for cfg in self.keys.iter_mut().filter(|k| k.active) {
            cfg.first = cfg.first_orig.max(firstdoy);
            cfg.last = cfg.last_orig.min(lastdoy);
        }
    }

    /// Periods written by at least one key, finest first.
    pub fn periods_in_use(&self) -> PeriodList {
        OutPeriod::ALL
            .into_iter()
            .filter(|&p| self.active_keys().any(|k| k.periods.contains(&p)))
            .collect()
    }

    /// Returns `true` if a soil-layer text file is needed for `period`.
    pub fn make_soil(&self, period: OutPeriod) -> bool {
        self.active_keys()
            .any(|k| k.has_soil_layers && k.periods.contains(&period))
    }

    /// Returns `true` if a regular text file is needed for `period`.
    pub fn make_regular(&self, period: OutPeriod) -> bool {
        self.active_keys()
            .any(|k| !k.has_soil_layers && k.periods.contains(&period))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETUP: &str = "\
# output setup
TEMP     AVG  YR  1  end  temp
PRECIP   SUM  mo  1  END  precip
VWCBULK  FIN  DY  1  366  vwcbulk
SWCBULK  off  DY  1  end  swcbulk
";

    // -- Key lines --

    #[test]
    fn parses_key_lines() {
        let (setup, diags) = OutputSetup::parse(SETUP, false).unwrap();
        assert!(diags.is_empty());

        let temp = setup.key(OutKey::Temp);
        assert!(temp.active);
        assert_eq!(temp.sumtype, OutSum::Average);
        assert_eq!(temp.periods.as_slice(), &[OutPeriod::Year]);
        assert_eq!((temp.first, temp.last), (1, 366));
        assert_eq!(temp.outfile, "temp");

        let precip = setup.key(OutKey::Precip);
        assert_eq!(precip.periods.as_slice(), &[OutPeriod::Month]);

        assert_eq!(setup.key(OutKey::VWCBulk).sumtype, OutSum::FinalValue);
        assert!(!setup.key(OutKey::SWCBulk).active);
        assert_eq!(setup.active_keys().count(), 3);
    }

    #[test]
    fn periods_and_file_families_in_use() {
        let (setup, _) = OutputSetup::parse(SETUP, false).unwrap();
        assert_eq!(
            setup.periods_in_use().as_slice(),
            &[OutPeriod::Day, OutPeriod::Month, OutPeriod::Year]
        );
        assert!(setup.make_soil(OutPeriod::Day));
        assert!(!setup.make_regular(OutPeriod::Day));
        assert!(setup.make_regular(OutPeriod::Month));
        assert!(!setup.make_soil(OutPeriod::Week));
    }

    #[test]
    fn timestep_overrides_period_column() {
        let text = "TIMESTEP dy wk\nTEMP AVG YR 1 end temp\nAET SUM MO 1 end aet\n";
        let (setup, _) = OutputSetup::parse(text, false).unwrap();
        for key in [OutKey::Temp, OutKey::AET] {
            assert_eq!(
                setup.key(key).periods.as_slice(),
                &[OutPeriod::Day, OutPeriod::Week]
            );
        }
    }

    #[test]
    fn too_many_timesteps_is_fatal() {
        let err = OutputSetup::parse("TIMESTEP dy wk mo yr dy\n", false).unwrap_err();
        assert!(matches!(err, OutputError::Config { line: 1, .. }));
    }

    // -- Warnings --

    #[test]
    fn fin_without_layers_falls_back_to_avg() {
        let (setup, diags) = OutputSetup::parse("TEMP FIN YR 1 end temp\n", false).unwrap();
        assert_eq!(setup.key(OutKey::Temp).sumtype, OutSum::Average);
        assert_eq!(diags.len(), 1);
        assert!(diags.contains("FIN"));
    }

    #[test]
    fn markers_and_deep_drainage_are_disabled() {
        let text = "WTHR AVG YR 1 end wthr\nDEEPSWC SUM YR 1 end deep\n";
        let (setup, diags) = OutputSetup::parse(text, false).unwrap();
        assert!(!setup.key(OutKey::AllWthr).active);
        assert!(!setup.key(OutKey::DeepSWC).active);
        assert_eq!(diags.len(), 2);

        let (setup, diags) = OutputSetup::parse(text, true).unwrap();
        assert!(setup.key(OutKey::DeepSWC).active);
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn outsep_is_ignored_with_a_warning() {
        let (setup, diags) = OutputSetup::parse("OUTSEP t\nTEMP AVG YR 1 end t\n", false).unwrap();
        assert!(diags.contains("OUTSEP"));
        assert!(setup.key(OutKey::Temp).active);
    }

    #[test]
    fn establishment_is_forced_to_yearly_sum() {
        let (setup, _) = OutputSetup::parse("ESTABL AVG YR 50 100 estab\n", false).unwrap();
        let estab = setup.key(OutKey::Estab);
        assert_eq!(estab.sumtype, OutSum::Sum);
        assert_eq!((estab.first_orig, estab.last_orig), (1, 366));
    }

    // -- Errors --

    #[test]
    fn fatal_lines() {
        assert!(matches!(
            OutputSetup::parse("TEMP AVG YR 1 end\n", false),
            Err(OutputError::Config { line: 1, .. })
        ));
        assert!(matches!(
            OutputSetup::parse("# c\nRAIN AVG YR 1 end r\n", false),
            Err(OutputError::UnknownKey(_))
        ));
        assert!(matches!(
            OutputSetup::parse("TEMP MAX YR 1 end t\n", false),
            Err(OutputError::UnknownPolicy(_))
        ));
        assert!(matches!(
            OutputSetup::parse("TEMP AVG DAY 1 end t\n", false),
            Err(OutputError::UnknownPeriod(_))
        ));
        assert!(matches!(
            OutputSetup::parse("TEMP AVG YR one end t\n", false),
            Err(OutputError::Config { .. })
        ));
        assert!(matches!(
            OutputSetup::parse("\n\nTEMP AVG YR 1 0 t\n", false),
            Err(OutputError::Config { line: 3, .. })
        ));
    }

    // -- Year bounds --

    #[test]
    fn new_year_clamps_bounds() {
        let (mut setup, _) =
            OutputSetup::parse("TEMP AVG DY 20 300 t\nPRECIP SUM DY 1 end p\n", false).unwrap();
        setup.new_year(50, 200);
        assert_eq!((setup.key(OutKey::Temp).first, setup.key(OutKey::Temp).last), (50, 200));
        setup.new_year(1, 365);
        assert_eq!((setup.key(OutKey::Temp).first, setup.key(OutKey::Temp).last), (20, 300));
        assert_eq!(setup.key(OutKey::Precip).last, 365);
        assert!(setup.key(OutKey::Precip).in_bounds(365));
        assert!(!setup.key(OutKey::Temp).in_bounds(19));
    }

    #[test]
    fn enable_applies_parser_rules() {
        let mut setup = OutputSetup::new();
        let mut diags = Diagnostics::new();
        setup
            .enable(OutKey::Runoff, OutSum::FinalValue, &[OutPeriod::Month], 1, 366, false, &mut diags)
            .unwrap();
        assert_eq!(setup.key(OutKey::Runoff).sumtype, OutSum::Average);
        assert!(setup.key(OutKey::Runoff).subscribes(OutPeriod::Month));
        assert!(!setup.key(OutKey::Runoff).subscribes(OutPeriod::Day));
        assert!(setup
            .enable(OutKey::Temp, OutSum::Sum, &[OutPeriod::Day], 1, 0, false, &mut diags)
            .is_err());
    }
}
