//! Identity and financial lookup tools

use super::{ParamKind, ParamSpec, Tool, ToolArgs, ToolContext};
use crate::lookup::LookupStore;
use crate::validation::{is_valid_aadhaar, is_valid_pan, is_valid_person_name};
use crate::Result;
use std::sync::Arc;
use tracing::info;

const INVALID_AADHAAR: &str = "Invalid Aadhaar format. Must be a 12-digit number.";
const INVALID_PAN: &str = "Invalid PAN format. Example: ABCDE1234F";

const PAN_PARAMS: &[ParamSpec] = &[ParamSpec::required("pan", ParamKind::String, "10-character PAN, e.g. ABCDE1234F")];
const AADHAAR_PARAMS: &[ParamSpec] = &[ParamSpec::required("aadhaar", ParamKind::String, "12-digit Aadhaar number")];

pub struct VerifyIdentityTool {
    lookup: Arc<dyn LookupStore>,
}

impl VerifyIdentityTool {
    pub fn new(lookup: Arc<dyn LookupStore>) -> Self {
        Self { lookup }
    }
}

const IDENTITY_PARAMS: &[ParamSpec] = &[
    ParamSpec::required("name", ParamKind::String, "Full name as on the PAN card"),
    ParamSpec::required("aadhaar", ParamKind::String, "12-digit Aadhaar number"),
    ParamSpec::required("pan", ParamKind::String, "10-character PAN"),
];

#[async_trait::async_trait]
impl Tool for VerifyIdentityTool {
    fn name(&self) -> &'static str {
        "VerifyIdentity"
    }

    fn description(&self) -> &'static str {
        "Verify user identity details using name, Aadhaar, and PAN. Takes three parameters: name, aadhaar, pan."
    }

    fn parameters(&self) -> &'static [ParamSpec] {
        IDENTITY_PARAMS
    }

    async fn execute(&self, _ctx: &ToolContext, args: &ToolArgs) -> Result<String> {
        let name = args.text("name").unwrap_or_default();
        let aadhaar = args.text("aadhaar").unwrap_or_default();
        let pan = args.text("pan").unwrap_or_default();

        if !is_valid_person_name(&name) {
            return Ok("Invalid name format. Only alphabets and spaces allowed.".to_string());
        }
        if !is_valid_aadhaar(&aadhaar) {
            return Ok(INVALID_AADHAAR.to_string());
        }
        if !is_valid_pan(&pan) {
            return Ok(INVALID_PAN.to_string());
        }

        let verified = self.lookup.verify_identity_triple(&name, &aadhaar, &pan).await?;
        info!(verified, "Identity verification");

        Ok(if verified {
            "Identity verified!".to_string()
        } else {
            "Identity verification failed.".to_string()
        })
    }
}

pub struct GetCibilTool {
    lookup: Arc<dyn LookupStore>,
}

impl GetCibilTool {
    pub fn new(lookup: Arc<dyn LookupStore>) -> Self {
        Self { lookup }
    }
}

#[async_trait::async_trait]
impl Tool for GetCibilTool {
    fn name(&self) -> &'static str {
        "GetCibil"
    }

    fn description(&self) -> &'static str {
        "Get the CIBIL of the user using their PAN"
    }

    fn parameters(&self) -> &'static [ParamSpec] {
        PAN_PARAMS
    }

    async fn execute(&self, _ctx: &ToolContext, args: &ToolArgs) -> Result<String> {
        let pan = args.text("pan").unwrap_or_default();
        if !is_valid_pan(&pan) {
            return Ok(INVALID_PAN.to_string());
        }

        match self.lookup.cibil_for_tax_id(&pan).await? {
            Some(score) => {
                info!(score, "CIBIL lookup");
                Ok(format!("The User's CIBIL score is {}.", score))
            }
            None => Ok("CIBIL score not found for given PAN.".to_string()),
        }
    }
}

pub struct GetSalaryTool {
    lookup: Arc<dyn LookupStore>,
}

impl GetSalaryTool {
    pub fn new(lookup: Arc<dyn LookupStore>) -> Self {
        Self { lookup }
    }
}

#[async_trait::async_trait]
impl Tool for GetSalaryTool {
    fn name(&self) -> &'static str {
        "GetSalary"
    }

    fn description(&self) -> &'static str {
        "Get the salary of the user using their PAN"
    }

    fn parameters(&self) -> &'static [ParamSpec] {
        PAN_PARAMS
    }

    async fn execute(&self, _ctx: &ToolContext, args: &ToolArgs) -> Result<String> {
        let pan = args.text("pan").unwrap_or_default();
        if !is_valid_pan(&pan) {
            return Ok(INVALID_PAN.to_string());
        }

        match self.lookup.income_for_tax_id(&pan).await? {
            Some(income) => Ok(format!("The User's salary is ₹{}.", income)),
            None => Ok("Salary not found for given PAN.".to_string()),
        }
    }
}

pub struct GetAddressTool {
    lookup: Arc<dyn LookupStore>,
}

impl GetAddressTool {
    pub fn new(lookup: Arc<dyn LookupStore>) -> Self {
        Self { lookup }
    }
}

#[async_trait::async_trait]
impl Tool for GetAddressTool {
    fn name(&self) -> &'static str {
        "GetAddress"
    }

    fn description(&self) -> &'static str {
        "Get the address of the user using their Aadhaar"
    }

    fn parameters(&self) -> &'static [ParamSpec] {
        AADHAAR_PARAMS
    }

    async fn execute(&self, _ctx: &ToolContext, args: &ToolArgs) -> Result<String> {
        let aadhaar = args.text("aadhaar").unwrap_or_default();
        if !is_valid_aadhaar(&aadhaar) {
            return Ok(INVALID_AADHAAR.to_string());
        }

        Ok(self
            .lookup
            .address_for_id(&aadhaar)
            .await?
            .unwrap_or_else(|| "No address found for the given Aadhaar number.".to_string()))
    }
}
