pub mod cm_eod_archive;
pub mod lib_nse;
