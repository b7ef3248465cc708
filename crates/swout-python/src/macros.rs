/// Generate a frozen `#[pyclass]` struct where each field is `f64`.
///
/// Also generates a `from_core()` method that copies values from the
/// corresponding Rust struct.
macro_rules! define_value_result {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident from $core_type:ty {
            $($field:ident),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[pyo3::pyclass(frozen)]
        $vis struct $name {
            $(
                #[pyo3(get)]
                pub $field: f64,
            )+
        }

        impl $name {
            pub fn from_core(v: &$core_type) -> Self {
                Self {
                    $(
                        $field: v.$field,
                    )+
                }
            }
        }
    };
}

/// Copy named `f64` fields of a struct into a `PyDict`.
macro_rules! values_to_dict {
    ($py:expr, $v:expr, $($field:ident),+ $(,)?) => {{
        let dict = pyo3::types::PyDict::new($py);
        $(
            dict.set_item(stringify!($field), $v.$field)?;
        )+
        dict
    }};
}
