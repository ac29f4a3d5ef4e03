//! Monte Carlo process-variation settings.

use serde::{Deserialize, Serialize};

use crate::dialog::{DialogOutcome, ModalHost};
use crate::error::{parse_field, ConfigError};

/// A spatially correlated variation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelatedVariation {
    pub std_dev: f64,
    #[serde(alias = "corr_length")]
    pub corr_len: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spread {
    pub std_dev: f64,
}

/// Within-wafer variation of waveguide width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaferVariation {
    pub width: CorrelatedVariation,
    pub height: CorrelatedVariation,
}

/// Wafer-to-wafer variation of waveguide width and silicon thickness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaferToWaferVariation {
    pub width: Spread,
    pub thickness: Spread,
}

/// Default process variation of one technology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloTechnology {
    pub name: String,
    pub wafer: WaferVariation,
    pub wafer_to_wafer: WaferToWaferVariation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Histograms {
    pub fsr: bool,
    pub gain: bool,
    pub wavelength: bool,
}

/// Editable state of the Monte Carlo form.
#[derive(Debug, Clone, PartialEq)]
pub struct MonteCarloForm {
    pub technologies: Vec<String>,
    pub technology: String,
    pub num_wafers: u32,
    pub num_dies: u32,
    pub histograms: Histograms,
    pub width_std_dev: String,
    pub width_corr_len: String,
    pub height_std_dev: String,
    pub height_corr_len: String,
    pub w2w_width_std_dev: String,
    pub w2w_thickness_std_dev: String,
}

impl Default for MonteCarloForm {
    fn default() -> Self {
        Self {
            technologies: Vec::new(),
            technology: String::new(),
            num_wafers: 1,
            num_dies: 1,
            histograms: Histograms::default(),
            width_std_dev: String::new(),
            width_corr_len: String::new(),
            height_std_dev: String::new(),
            height_corr_len: String::new(),
            w2w_width_std_dev: String::new(),
            w2w_thickness_std_dev: String::new(),
        }
    }
}

/// Monte Carlo run settings chosen by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloParams {
    pub num_wafers: u32,
    pub num_dies: u32,
    pub technology: String,
    pub histograms: Histograms,
    pub waf_var: WaferVariation,
    pub waf_to_waf_var: WaferToWaferVariation,
}

pub struct MonteCarloDialog {
    table: Vec<MonteCarloTechnology>,
    form: MonteCarloForm,
    loaded_technology: Option<String>,
}

impl MonteCarloDialog {
    pub fn new(table: Vec<MonteCarloTechnology>) -> Self {
        Self {
            table,
            form: MonteCarloForm::default(),
            loaded_technology: None,
        }
    }

    /// Parse a JSON array of [`MonteCarloTechnology`] records.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn form(&self) -> &MonteCarloForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut MonteCarloForm {
        &mut self.form
    }

    /// List the available technologies and select the first.
    pub fn update(&mut self) -> Result<(), ConfigError> {
        let first = self
            .table
            .first()
            .map(|t| t.name.clone())
            .ok_or(ConfigError::NoMonteCarloData)?;
        self.form.technologies = self.table.iter().map(|t| t.name.clone()).collect();
        log::info!("Loaded Monte Carlo data for {} technologies", self.table.len());
        self.select_technology(&first)
    }

    /// Fill the variation fields from a technology's defaults.
    pub fn select_technology(&mut self, name: &str) -> Result<(), ConfigError> {
        let tech = self
            .table
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| ConfigError::UnknownTechnology(name.to_string()))?;
        let (wafer, w2w) = (tech.wafer, tech.wafer_to_wafer);

        let form = &mut self.form;
        form.technology = name.to_string();
        form.width_std_dev = wafer.width.std_dev.to_string();
        form.width_corr_len = wafer.width.corr_len.to_string();
        form.height_std_dev = wafer.height.std_dev.to_string();
        form.height_corr_len = wafer.height.corr_len.to_string();
        form.w2w_width_std_dev = w2w.width.std_dev.to_string();
        form.w2w_thickness_std_dev = w2w.thickness.std_dev.to_string();
        log::debug!("Selected Monte Carlo technology '{name}'");
        Ok(())
    }

    /// Show the dialog and collect the run settings. The technology list is
    /// reloaded when `technology` differs from the previous call. Returns
    /// `None` if the user cancels.
    pub fn get_parameters<H: ModalHost<Self> + ?Sized>(
        &mut self,
        technology: &str,
        host: &mut H,
    ) -> Result<Option<MonteCarloParams>, ConfigError> {
        if self.loaded_technology.as_deref() != Some(technology) {
            self.update()?;
            self.loaded_technology = Some(technology.to_string());
        }

        if host.exec(self) == DialogOutcome::Cancelled {
            return Ok(None);
        }

        let form = &self.form;
        Ok(Some(MonteCarloParams {
            num_wafers: form.num_wafers.max(1),
            num_dies: form.num_dies.max(1),
            technology: form.technology.clone(),
            histograms: form.histograms,
            waf_var: WaferVariation {
                width: CorrelatedVariation {
                    std_dev: parse_field("width std_dev", &form.width_std_dev)?,
                    corr_len: parse_field("width corr_len", &form.width_corr_len)?,
                },
                height: CorrelatedVariation {
                    std_dev: parse_field("height std_dev", &form.height_std_dev)?,
                    corr_len: parse_field("height corr_len", &form.height_corr_len)?,
                },
            },
            waf_to_waf_var: WaferToWaferVariation {
                width: Spread {
                    std_dev: parse_field("wafer-to-wafer width std_dev", &form.w2w_width_std_dev)?,
                },
                thickness: Spread {
                    std_dev: parse_field(
                        "wafer-to-wafer thickness std_dev",
                        &form.w2w_thickness_std_dev,
                    )?,
                },
            },
        }))
    }
}
