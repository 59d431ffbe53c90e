pub type Result<T> = std::result::Result<T, crate::error::Error>;

/// Fails with `InvalidArgument` when the condition over a caller-supplied
/// argument does not hold.
#[macro_export]
macro_rules! verify_arg {
    ($name:expr, $expr:expr) => {{
        if !$expr {
            return Err($crate::result::arg_check_failed(
                stringify!($name),
                stringify!($expr),
            ));
        }
    }};
}

/// Fails with `InvalidData` when the condition over bytes coming off the wire
/// does not hold. Data failures are fatal for the stream.
#[macro_export]
macro_rules! verify_data {
    ($name:expr, $expr:expr) => {{
        if !$expr {
            return Err($crate::result::data_check_failed(
                stringify!($name),
                stringify!($expr),
            ));
        }
    }};
}

#[cold]
pub fn arg_check_failed(name: &str, condition: &str) -> crate::error::Error {
    crate::error::Error::invalid_arg(name, condition)
}

#[cold]
pub fn data_check_failed(name: &str, condition: &str) -> crate::error::Error {
    crate::error::Error::invalid_data(name, condition)
}
