#![forbid(unsafe_code)]

use fieldops_kernel_contracts::evidence::ChecklistData;
use fieldops_kernel_contracts::verdict::{ChecklistDeficiency, ChecklistField, ChecklistValidation};

/// Reports every missing required field; an absent checklist yields a single error.
pub fn validate_checklist(checklist: Option<&ChecklistData>) -> ChecklistValidation {
    let Some(checklist) = checklist else {
        return ChecklistValidation::from_errors(vec![ChecklistDeficiency::NotCompleted]);
    };

    let required = [
        (ChecklistField::TipoFalla, &checklist.tipo_falla),
        (ChecklistField::AccionRealizada, &checklist.accion_realizada),
        (ChecklistField::PruebasPost, &checklist.pruebas_post),
    ];
    let errors = required
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| ChecklistDeficiency::FieldMissing { field })
        .collect();

    ChecklistValidation::from_errors(errors)
}
