use crate::db::nse::cm_eod_archive::NseCmEodArchive;

pub struct ProdDb {}

impl ProdDb {
    pub fn nse_cm_eod() -> NseCmEodArchive {
        NseCmEodArchive::new("/opt/appdata/nse-cm-eod")
    }
}
