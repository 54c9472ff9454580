pub mod loss_rate;
pub mod temporal;
