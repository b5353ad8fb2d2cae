macro_rules! impl_value_from {
    ($($t:ty => $variant:ident), *) => {
        $(
            impl From<$t> for SnmpValue {
                fn from(value: $t) -> Self {
                    SnmpValue::$variant(value.into())
                }
            }
        )*
    };
}

/// Joins the fields of a perfdata entry with `;`, dropping trailing empty fields.
macro_rules! perf_string {
    ($label:expr, $( $field:expr ), *) => {
        {
            let mut s = String::new();
            s.push_str(&format!("{}=", $label));
            $(
                s.push_str(&$field);
                s.push(';');
            )*
            s.trim_end_matches(';').to_string()
        }
    };
}
