/// Builds a [`Dict`](crate::value::Dict), converting keys and values with
/// `Into`.
///
/// ```rust
/// use pressroom::{dict, value::Value};
///
/// let dict = dict!["name" => "Ada", "age" => 36u8];
/// assert_eq!(dict["name"], Value::from("Ada"));
/// ```
#[doc(hidden)]
#[macro_export]
macro_rules! dict {
    ($($key:expr => $value:expr),* $(,)?) => ({
        #[allow(unused_mut)]
        let mut dict: $crate::value::Dict = $crate::value::Dict::new();
        $(dict.insert($key.into(), $value.into());)*
        dict
    });
}

/// Like [`dict!`], but wraps the result into a [`Value`](crate::value::Value).
#[doc(hidden)]
#[macro_export]
macro_rules! value {
    ($($key:expr => $value:expr),* $(,)?) => (
        $crate::value::Value::from($crate::dict![$($key => $value),*])
    );
}

/// Evaluates the block, logging how long it took at `debug` level.
///
/// ```rust
/// let sum = pressroom::time!("sum", (1..=4).sum::<u32>());
/// assert_eq!(sum, 10);
/// ```
#[doc(hidden)]
#[macro_export]
macro_rules! time {
    ($phase:literal, $($token:tt)*) => ({
        let start = std::time::Instant::now();
        let value = { $($token)* };
        $crate::tracing::debug!(phase = $phase, elapsed_ms = start.elapsed().as_millis() as u64, "phase done");
        value
    });
}

pub use {dict, value, time};
