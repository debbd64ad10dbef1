#[macro_export]
macro_rules! infoln {
    ($($rest:tt)*) => {
        log::info!($($rest)*)
    };
}

#[macro_export]
macro_rules! warnln {
    ($($rest:tt)*) => {
        log::warn!($($rest)*)
    };
}

#[macro_export]
macro_rules! errorln {
    ($($rest:tt)*) => {
        log::error!($($rest)*)
    };
}

#[cfg(feature = "debug")]
#[macro_export]
macro_rules! debugln {
    ($($rest:tt)*) => {
        log::debug!($($rest)*)
    }
}

#[cfg(not(feature = "debug"))]
#[macro_export]
macro_rules! debugln {
    ($($rest:tt)*) => {
        ()
    };
}
