//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dynamic model assembly and macro-connection graph builder."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Parameters file (`.par`).

use hard_xml::XmlWrite;

use crate::error::Result;
use crate::parameters::ParametersSet;
use crate::xml::{to_document, DYNAWO_NAMESPACE};

#[derive(Debug, Clone, PartialEq, XmlWrite)]
#[xml(tag = "parametersSet")]
pub struct ParametersSetsXml {
    #[xml(attr = "xmlns")]
    pub xmlns: String,
    #[xml(child = "set")]
    pub sets: Vec<SetXml>,
}

#[derive(Debug, Clone, PartialEq, XmlWrite)]
#[xml(tag = "set")]
pub struct SetXml {
    #[xml(attr = "id")]
    pub id: String,
    #[xml(child = "par")]
    pub parameters: Vec<ParXml>,
}

#[derive(Debug, Clone, PartialEq, XmlWrite)]
#[xml(tag = "par")]
pub struct ParXml {
    #[xml(attr = "type")]
    pub kind: String,
    #[xml(attr = "name")]
    pub name: String,
    #[xml(attr = "value")]
    pub value: String,
}

impl From<&ParametersSet> for SetXml {
    fn from(set: &ParametersSet) -> Self {
        Self {
            id: set.id.clone(),
            parameters: set
                .parameters
                .iter()
                .map(|parameter| ParXml {
                    kind: parameter.kind.to_string(),
                    name: parameter.name.clone(),
                    value: parameter.value.clone(),
                })
                .collect(),
        }
    }
}

pub fn write_parameters<'s>(sets: impl IntoIterator<Item = &'s ParametersSet>) -> Result<String> {
    to_document(&ParametersSetsXml {
        xmlns: DYNAWO_NAMESPACE.to_owned(),
        sets: sets.into_iter().map(Into::into).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_typed_parameters() {
        let mut set = ParametersSet::new("OMEGA_REF");
        set.add_int("nbGen", 1);
        set.add_double("weight_gen_0", 1211.0);
        let xml = write_parameters([&set]).unwrap();
        assert!(xml.contains(r#"<parametersSet xmlns="http://www.rte-france.com/dynawo">"#));
        assert!(xml.contains(r#"<set id="OMEGA_REF">"#));
        assert!(xml.contains(r#"<par type="INT" name="nbGen" value="1"/>"#));
        assert!(xml.contains(r#"<par type="DOUBLE" name="weight_gen_0" value="1211"/>"#));
    }
}
