use crate::error::DomainError;
use crate::math::ParameterDomain;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DomainDraft {
    pub u_range: (f64, f64),
    pub v_range: (f64, f64),
    pub step: f64,
}

impl From<&ParameterDomain> for DomainDraft {
    fn from(domain: &ParameterDomain) -> Self {
        Self {
            u_range: (domain.u_from, domain.u_to),
            v_range: (domain.v_from, domain.v_to),
            step: domain.step,
        }
    }
}

impl DomainDraft {
    pub fn to_domain(&self) -> Result<ParameterDomain, DomainError> {
        let domain = ParameterDomain {
            u_from: self.u_range.0,
            u_to: self.u_range.1,
            v_from: self.v_range.0,
            v_to: self.v_range.1,
            step: self.step,
        };
        domain.validate()?;
        Ok(domain)
    }
}

pub struct UiState {
    pub domain: DomainDraft,
    pub domain_dirty: bool,
    pub domain_error: Option<String>,
    pub show_help: bool,
}

impl UiState {
    pub fn new(domain: &ParameterDomain) -> Self {
        Self {
            domain: DomainDraft::from(domain),
            domain_dirty: false,
            domain_error: None,
            show_help: true,
        }
    }

    pub fn domain_applied(&mut self, domain: &ParameterDomain) {
        self.domain = DomainDraft::from(domain);
        self.domain_dirty = false;
        self.domain_error = None;
    }
}
