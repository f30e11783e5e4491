pub mod impl_whole_fetch;
