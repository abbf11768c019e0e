use crate::errors::CausalError;

/// Create a string of all available items.
pub fn items_to_strings(items: Vec<&str>) -> String {
    let mut s = String::new();
    for i in items {
        s.push_str(i);
        s.push_str(&String::from(", "));
    }
    s
}

/// Format a list of method or feature names for log messages.
pub fn fmt_names<T: AsRef<str>>(v: &[T]) -> String {
    if v.is_empty() {
        return String::from("-");
    }
    v.iter().map(|s| s.as_ref()).collect::<Vec<&str>>().join(", ")
}

// Validation
pub fn validate_positive_float_parameter(value: f64, parameter: &str) -> Result<(), CausalError> {
    validate_float_parameter(value, 0.0, f64::INFINITY, parameter)
}

pub fn validate_float_parameter(value: f64, min: f64, max: f64, parameter: &str) -> Result<(), CausalError> {
    if value.is_nan() || value < min || max < value {
        let ex_msg = format!("real value within rang {} and {}", min, max);
        Err(CausalError::InvalidParameter(
            parameter.to_string(),
            ex_msg,
            value.to_string(),
        ))
    } else {
        Ok(())
    }
}

pub fn validate_count_parameter(value: usize, min: usize, parameter: &str) -> Result<(), CausalError> {
    if value < min {
        Err(CausalError::InvalidParameter(
            parameter.to_string(),
            format!("integer of at least {}", min),
            value.to_string(),
        ))
    } else {
        Ok(())
    }
}
