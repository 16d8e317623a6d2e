pub mod intent;
pub mod props;
pub mod wizard;
