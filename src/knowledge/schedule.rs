//! Draw-time reference table and text lookup.
//!
//! Resolution order for [`find_by_text`]:
//! 1. an "everything" phrase returns the whole table,
//! 2. a group phrase returns that group,
//! 3. otherwise alias substring match against individual entries,
//! 4. otherwise nothing (the caller shows the category hint).

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use ScheduleGroup::{Hanoi, IntlStocks, Laos, Others, ThaiGov, ThaiStocks, Yeekee};

/// LINE caps a text message at 5000 characters; stay comfortably below.
pub const MAX_CHUNK_CHARS: usize = 4500;

/// Draw category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleGroup {
    Laos,
    Hanoi,
    ThaiStocks,
    ThaiGov,
    IntlStocks,
    Yeekee,
    Others,
}

impl ScheduleGroup {
    pub const ALL: [ScheduleGroup; 7] = [Laos, Hanoi, ThaiStocks, ThaiGov, IntlStocks, Yeekee, Others];

    /// Display name used in the "try these categories" hint.
    pub fn display_name(self) -> &'static str {
        match self {
            Laos => "หวยลาว",
            Hanoi => "หวยฮานอย",
            ThaiStocks => "หุ้นไทย",
            ThaiGov => "หวยรัฐบาล",
            IntlStocks => "หุ้นต่างประเทศ",
            Yeekee => "ยี่กี",
            Others => "อื่นๆ",
        }
    }
}

/// One row of the static draw-time table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduleEntry {
    pub id: &'static str,
    pub group: ScheduleGroup,
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub close_at: Option<&'static str>,
    pub announce_at: Option<&'static str>,
    pub note: Option<&'static str>,
}

const fn entry(
    id: &'static str,
    group: ScheduleGroup,
    name: &'static str,
    aliases: &'static [&'static str],
    close_at: Option<&'static str>,
    announce_at: Option<&'static str>,
    note: Option<&'static str>,
) -> ScheduleEntry {
    ScheduleEntry {
        id,
        group,
        name,
        aliases,
        close_at,
        announce_at,
        note,
    }
}

pub static DRAW_TIMES: &[ScheduleEntry] = &[
    entry("หวยสาละวัน-visa", Laos, "หวยสาละวัน VISA", &["หวยสาละวัน VISA"], Some("05:00"), Some("05:15"), None),
    entry("หวยลาวประตูชัย", Laos, "หวยลาวประตูชัย", &["หวยลาวประตูชัย"], Some("05:40"), Some("05:45"), None),
    entry("หวยหลวงพระบาง-visa", Laos, "หวยหลวงพระบาง VISA", &["หวยหลวงพระบาง VISA"], Some("06:05"), Some("06:15"), None),
    entry("หวยลาวสันติภาพ", Laos, "หวยลาวสันติภาพ", &["หวยลาวสันติภาพ"], Some("06:40"), Some("06:45"), None),
    entry("หวยเวียงจันทร์-visa", Laos, "หวยเวียงจันทร์ VISA", &["หวยเวียงจันทร์ VISA"], Some("07:05"), Some("07:15"), None),
    entry("หวยประชาชนลาว", Laos, "หวยประชาชนลาว", &["หวยประชาชนลาว"], Some("07:40"), Some("07:45"), None),
    entry("หวยลาว-visa", Laos, "หวยลาว VISA", &["หวยลาว VISA"], Some("08:00"), Some("08:15"), None),
    entry("หวยฮานอยเช้า", Hanoi, "หวยฮานอยเช้า", &["หวยฮานอยเช้า"], Some("08:10"), Some("08:30"), None),
    entry("หวยลาวเช้า", Laos, "หวยลาวเช้า", &["หวยลาวเช้า"], Some("08:15"), Some("08:30"), None),
    entry("หวยลาว-extra", Laos, "หวยลาว EXTRA", &["หวยลาว EXTRA"], Some("08:20"), Some("08:30"), None),
    entry("นิเคอิรอบเช้า-vip", IntlStocks, "นิเคอิรอบเช้า VIP", &["นิเคอิรอบเช้า VIP"], Some("08:40"), Some("09:05"), None),
    entry("ลาวพัฒนาเช้า", Laos, "ลาวพัฒนาเช้า", &["ลาวพัฒนาเช้า"], Some("08:45"), Some("09:00"), None),
    entry("นิเคอิพิเศษ-เช้า", IntlStocks, "นิเคอิพิเศษ เช้า", &["นิเคอิพิเศษ เช้า"], Some("08:50"), Some("09:05"), None),
    entry("หวย-ธกส", ThaiGov, "หวย ธกส.", &["หวย ธกส."], Some("วันที่ 16 เวลา 09:00"), Some("16:00"), None),
    entry("นิเคอิ-visa-เช้า", IntlStocks, "นิเคอิ VISA (เช้า)", &["นิเคอิ VISA (เช้า)"], Some("09:00"), Some("09:15"), None),
    entry("หวยฮานอยอาเชียน", Hanoi, "หวยฮานอยอาเชียน", &["หวยฮานอยอาเชียน"], Some("09:15"), Some("09:30"), None),
    entry("นิเคอิรอบเช้า", IntlStocks, "นิเคอิรอบเช้า", &["นิเคอิรอบเช้า"], Some("09:20"), Some("09:30"), None),
    entry("ลาวพัฒนาเช้า-vip", Laos, "ลาวพัฒนาเช้า VIP", &["ลาวพัฒนาเช้า VIP"], Some("09:45"), Some("10:00"), None),
    entry("จีนพิเศษ-เช้า", IntlStocks, "จีนพิเศษ เช้า", &["จีนพิเศษ เช้า"], Some("09:50"), Some("10:05"), None),
    entry("หุ้นจีนรอบเช้า-vip", IntlStocks, "หุ้นจีนรอบเช้า VIP", &["หุ้นจีนรอบเช้า VIP"], Some("10:00"), Some("10:05"), None),
    entry("จีน-visa-เช้า", IntlStocks, "จีน VISA (เช้า)", &["จีน VISA (เช้า)"], Some("10:00"), Some("10:15"), None),
    entry("หวยลาว-tv", Laos, "หวยลาว TV", &["หวยลาว TV"], Some("10:15"), Some("10:30"), None),
    entry("หุ้นจีนเช้า", IntlStocks, "หุ้นจีนเช้า", &["หุ้นจีนเช้า"], Some("10:15"), Some("10:30"), None),
    entry("ฮั่งเส็งรอบเช้า-vip", IntlStocks, "ฮั่งเส็งรอบเช้า VIP", &["ฮั่งเส็งรอบเช้า VIP"], Some("10:20"), Some("10:35"), None),
    entry("ฮั่งเส็งพิเศษ-เช้า", IntlStocks, "ฮั่งเส็งพิเศษ เช้า", &["ฮั่งเส็งพิเศษ เช้า"], Some("10:20"), Some("10:35"), None),
    entry("หวย-ออมสิน", ThaiGov, "หวย ออมสิน", &["หวย ออมสิน"], Some("วันที่ 1 เวลา 10:30"), Some("14:00"), None),
    entry("ฮั่งเส็งรอบเช้า", IntlStocks, "ฮั่งเส็งรอบเช้า", &["ฮั่งเส็งรอบเช้า"], Some("10:45"), Some("11:05"), None),
    entry("หวยฮานอย-hd", Hanoi, "หวยฮานอย HD", &["หวยฮานอย HD"], Some("11:00"), Some("11:30"), None),
    entry("ฮั่งเส็ง-visa-เช้า", IntlStocks, "ฮั่งเส็ง VISA (เช้า)", &["ฮั่งเส็ง VISA (เช้า)"], Some("11:00"), Some("11:15"), None),
    entry("แม่โขงทูเดย์", Laos, "แม่โขงทูเดย์", &["แม่โขงทูเดย์"], Some("11:00"), Some("11:15"), None),
    entry("หุ้นไต้หวัน-vip", IntlStocks, "หุ้นไต้หวัน VIP", &["หุ้นไต้หวัน VIP"], Some("11:10"), Some("11:35"), None),
    entry("ลาวมั่งคั่ง", Laos, "ลาวมั่งคั่ง", &["ลาวมั่งคั่ง"], Some("11:15"), Some("11:30"), None),
    entry("หวยพม่า", IntlStocks, "หวยพม่า", &["หวยพม่า"], Some("11:15"), Some("11:30"), None),
    entry("ไต้หวันพิเศษ", IntlStocks, "ไต้หวันพิเศษ", &["ไต้หวันพิเศษ"], Some("11:30"), Some("11:45"), None),
    entry("ลาวพลัส", Laos, "ลาวพลัส", &["ลาวพลัส"], Some("11:45"), Some("12:05"), None),
    entry("หุ้นเกาหลี-vip", IntlStocks, "หุ้นเกาหลี VIP", &["หุ้นเกาหลี VIP"], Some("11:55"), Some("12:35"), None),
    entry("หุ้นไต้หวัน", IntlStocks, "หุ้นไต้หวัน", &["หุ้นไต้หวัน"], Some("12:00"), Some("12:35"), None),
    entry("หวยฮ่องกง-visa", IntlStocks, "หวยฮ่องกง VISA", &["หวยฮ่องกง VISA"], Some("12:00"), Some("12:15"), None),
    entry("หวยฮานอยสตาร์", Hanoi, "หวยฮานอยสตาร์", &["หวยฮานอยสตาร์"], Some("12:10"), Some("12:30"), None),
    entry("หวยลาวพัฒนาเที่ยง", Laos, "หวยลาวพัฒนาเที่ยง", &["หวยลาวพัฒนาเที่ยง"], Some("12:15"), Some("12:30"), None),
    entry("เกาหลีพิเศษ", IntlStocks, "เกาหลีพิเศษ", &["เกาหลีพิเศษ"], Some("12:20"), Some("12:35"), None),
    entry("นิเคอิรอบบ่าย", IntlStocks, "นิเคอิรอบบ่าย", &["นิเคอิรอบบ่าย"], Some("12:30"), Some("13:30"), None),
    entry("นิเคอิรอบบ่าย-vip", IntlStocks, "นิเคอิรอบบ่าย VIP", &["นิเคอิรอบบ่าย VIP"], Some("13:00"), Some("13:30"), None),
    entry("นิเคอิ-visa-บ่าย", IntlStocks, "นิเคอิ VISA (บ่าย)", &["นิเคอิ VISA (บ่าย)"], Some("13:00"), Some("13:15"), None),
    entry("หุ้นเกาหลี", IntlStocks, "หุ้นเกาหลี", &["หุ้นเกาหลี"], Some("13:10"), Some("13:50"), None),
    entry("นิเคอิพิเศษ-บ่าย", IntlStocks, "นิเคอิพิเศษ บ่าย", &["นิเคอิพิเศษ บ่าย"], Some("13:10"), Some("13:30"), None),
    entry("แม่โขง-hd", Laos, "แม่โขง HD", &["แม่โขง HD"], Some("13:20"), Some("13:35"), None),
    entry("หวยลาว-hd", Laos, "หวยลาว HD", &["หวยลาว HD"], Some("13:30"), Some("13:45"), None),
    entry("หุ้นจีนรอบบ่าย", IntlStocks, "หุ้นจีนรอบบ่าย", &["หุ้นจีนรอบบ่าย"], Some("13:30"), Some("14:00"), None),
    entry("หวยฮานอย-tv", Hanoi, "หวยฮานอย TV", &["หวยฮานอย TV"], Some("14:00"), Some("14:30"), None),
    entry("จีน-visa-บ่าย", IntlStocks, "จีน VISA (บ่าย)", &["จีน VISA (บ่าย)"], Some("14:00"), Some("14:15"), None),
    entry("หุ้นจีนรอบบ่าย-vip", IntlStocks, "หุ้นจีนรอบบ่าย VIP", &["หุ้นจีนรอบบ่าย VIP"], Some("14:00"), Some("14:25"), None),
    entry("จีนพิเศษ-บ่าย", IntlStocks, "จีนพิเศษ บ่าย", &["จีนพิเศษ บ่าย"], Some("14:10"), Some("14:25"), None),
    entry("แม่โขงเมก้า", Laos, "แม่โขงเมก้า", &["แม่โขงเมก้า"], Some("14:30"), Some("14:45"), None),
    entry("ฮั่งเส็งรอบบ่าย", IntlStocks, "ฮั่งเส็งรอบบ่าย", &["ฮั่งเส็งรอบบ่าย"], Some("14:40"), Some("15:00"), None),
    entry("ฮั่งเส็ง-visa-บ่าย", IntlStocks, "ฮั่งเส็ง VISA (บ่าย)", &["ฮั่งเส็ง VISA (บ่าย)"], Some("15:00"), Some("15:15"), None),
    entry("ฮั่งเส็งรอบบ่าย-vip", IntlStocks, "ฮั่งเส็งรอบบ่าย VIP", &["ฮั่งเส็งรอบบ่าย VIP"], Some("15:10"), Some("15:30"), None),
    entry("ลาวนครหลวง", Laos, "ลาวนครหลวง", &["ลาวนครหลวง"], Some("15:15"), Some("15:30"), None),
    entry("ฮั่งเส็งพิเศษ-บ่าย", IntlStocks, "ฮั่งเส็งพิเศษ บ่าย", &["ฮั่งเส็งพิเศษ บ่าย"], Some("15:15"), Some("15:25"), None),
    entry("แม่โขงสตาร์", Laos, "แม่โขงสตาร์", &["แม่โขงสตาร์"], Some("15:20"), Some("15:35"), None),
    entry("หวยรัฐบาลไทย", ThaiGov, "หวยรัฐบาลไทย", &["หวยรัฐบาลไทย"], Some("วันที่ 16 เวลา 15:25"), Some("16:25"), None),
    entry("หวยลาวสตาร์", Laos, "หวยลาวสตาร์", &["หวยลาวสตาร์"], Some("15:30"), Some("15:45"), None),
    entry("สิงคโปร์พิเศษ", IntlStocks, "สิงคโปร์พิเศษ", &["สิงคโปร์พิเศษ"], Some("15:40"), Some("15:55"), None),
    entry("หุ้นสิงคโปร์", IntlStocks, "หุ้นสิงคโปร์", &["หุ้นสิงคโปร์"], Some("15:55"), Some("16:30"), None),
    entry("หวยฮานอย-visa", Hanoi, "หวยฮานอย VISA", &["หวยฮานอย VISA"], Some("15:55"), Some("16:15"), None),
    entry("หวยฮานอยกาชาด", Hanoi, "หวยฮานอยกาชาด", &["หวยฮานอยกาชาด"], Some("16:00"), Some("16:30"), None),
    entry("หวยฮานอยเฉพาะกิจ", Hanoi, "หวยฮานอยเฉพาะกิจ", &["หวยฮานอยเฉพาะกิจ"], Some("16:00"), Some("16:30"), None),
    entry("หุ้นไทยค้าง", ThaiStocks, "หุ้นไทยค้าง", &["หุ้นไทยค้าง"], Some("16:10"), Some("16:30"), None),
    entry("หวยฮานอยดานัง", Hanoi, "หวยฮานอยดานัง", &["หวยฮานอยดานัง"], Some("16:15"), Some("16:30"), None),
    entry("หุ้นสิงคโปร์-vip", IntlStocks, "หุ้นสิงคโปร์ VIP", &["หุ้นสิงคโปร์ VIP"], Some("16:20"), Some("17:05"), None),
    entry("เวียดนามพิเศษ-บ่าย", Hanoi, "เวียดนามพิเศษ บ่าย", &["เวียดนามพิเศษ บ่าย"], Some("16:20"), Some("16:35"), None),
    entry("แม่โขงพลัส", Laos, "แม่โขงพลัส", &["แม่โขงพลัส"], Some("16:25"), Some("16:40"), None),
    entry("หุ้นไทยเย็น", ThaiStocks, "หุ้นไทยเย็น", &["หุ้นไทยเย็น"], Some("16:30"), Some("16:50"), None),
    entry("หุ้นอินเดีย", IntlStocks, "หุ้นอินเดีย", &["หุ้นอินเดีย"], Some("16:40"), Some("17:30"), None),
    entry("หวยฮานอยพิเศษ", Hanoi, "หวยฮานอยพิเศษ", &["หวยฮานอยพิเศษ"], Some("17:00"), Some("17:30"), None),
    entry("แม่โขงพิเศษ", Laos, "แม่โขงพิเศษ", &["แม่โขงพิเศษ"], Some("17:10"), Some("17:25"), None),
    entry("ฮานอยสามัคคี", Hanoi, "ฮานอยสามัคคี", &["ฮานอยสามัคคี"], Some("17:15"), Some("17:30"), None),
    entry("หวยมาเลย์", IntlStocks, "หวยมาเลย์", &["หวยมาเลย์"], Some("18:00"), Some("18:30"), None),
    entry("หวยฮานอยปกติ", Hanoi, "หวยฮานอยปกติ", &["หวยฮานอยปกติ"], Some("18:10"), Some("18:30"), None),
    entry("แม่โขงปกติ", Laos, "แม่โขงปกติ", &["แม่โขงปกติ"], Some("18:10"), Some("18:25"), None),
    entry("หวยเวียดนามปกติ-ออนไลน์", Hanoi, "หวยเวียดนามปกติ ออนไลน์", &["หวยเวียดนามปกติ ออนไลน์"], Some("18:10"), Some("18:30"), None),
    entry("หวยลาว-super", Laos, "หวยลาว Super", &["หวยลาว Super"], Some("18:30"), Some("19:00"), None),
    entry("หวยฮานอยพัฒนา", Hanoi, "หวยฮานอยพัฒนา", &["หวยฮานอยพัฒนา"], Some("19:10"), Some("19:30"), None),
    entry("หวยฮานอย-vip", Hanoi, "หวยฮานอย VIP", &["หวยฮานอย VIP"], Some("19:10"), Some("19:30"), None),
    entry("หวยเวียดนามvip-ออนไลน์", Hanoi, "หวยเวียดนามVIP ออนไลน์", &["หวยเวียดนามVIP ออนไลน์"], Some("19:10"), Some("19:30"), None),
    entry("แม่โขง-vip", Laos, "แม่โขง VIP", &["แม่โขง VIP"], Some("19:30"), Some("19:45"), None),
    entry("หวยลาวพิเศษ", Laos, "หวยลาวพิเศษ", &["หวยลาวพิเศษ"], Some("19:45"), Some("20:00"), None),
    entry("หวยลาวพัฒนา", Laos, "หวยลาวพัฒนา", &["หวยลาวพัฒนา"], Some("20:10"), Some("20:25"), None),
    entry("หวยลาวสามัคคี", Laos, "หวยลาวสามัคคี", &["หวยลาวสามัคคี"], Some("20:10"), Some("20:30"), None),
    entry("หวยลาวอาเซียน", Laos, "หวยลาวอาเซียน", &["หวยลาวอาเซียน"], Some("20:40"), Some("21:00"), None),
    entry("หวยฮานอย-4d", Hanoi, "หวยฮานอย 4D", &["หวยฮานอย 4D"], Some("20:40"), Some("21:00"), None),
    entry("อังกฤษ-visa", IntlStocks, "อังกฤษ VISA", &["อังกฤษ VISA"], Some("21:00"), Some("21:15"), None),
    entry("แม่โขงพัฒนา", Laos, "แม่โขงพัฒนา", &["แม่โขงพัฒนา"], Some("21:00"), Some("21:15"), None),
    entry("ลาวสามัคคี-vip", Laos, "ลาวสามัคคี VIP", &["ลาวสามัคคี VIP"], Some("21:05"), Some("21:30"), None),
    entry("หวยลาว-vip", Laos, "หวยลาว VIP", &["หวยลาว VIP"], Some("21:10"), Some("21:30"), None),
    entry("หุ้นอังกฤษ-vip", IntlStocks, "หุ้นอังกฤษ VIP", &["หุ้นอังกฤษ VIP"], Some("21:10"), Some("21:50"), None),
    entry("หวยลาวรุ่งเรือง", Laos, "หวยลาวรุ่งเรือง", &["หวยลาวรุ่งเรือง"], Some("21:15"), Some("21:30"), None),
    entry("หวยลาวสตาร์-vip", Laos, "หวยลาวสตาร์ VIP", &["หวยลาวสตาร์ VIP"], Some("21:30"), Some("22:00"), None),
    entry("ฮานอยดึก", Hanoi, "ฮานอยดึก", &["ฮานอยดึก"], Some("22:00"), Some("22:30"), None),
    entry("หวยฮานอย-extra", Hanoi, "หวยฮานอย EXTRA", &["หวยฮานอย EXTRA"], Some("22:00"), Some("22:30"), None),
    entry("เยอรมัน-visa", IntlStocks, "เยอรมัน VISA", &["เยอรมัน VISA"], Some("22:00"), Some("23:55"), None),
    entry("รัสเซียพิเศษ", IntlStocks, "รัสเซียพิเศษ", &["รัสเซียพิเศษ"], Some("22:10"), Some("22:25"), None),
    entry("หุ้นเยอรมัน", IntlStocks, "หุ้นเยอรมัน", &["หุ้นเยอรมัน"], Some("22:15"), Some("23:55"), None),
    entry("หุ้นอังกฤษ", IntlStocks, "หุ้นอังกฤษ", &["หุ้นอังกฤษ"], Some("22:20"), Some("23:55"), None),
    entry("หุ้นเยอรมัน-vip", IntlStocks, "หุ้นเยอรมัน VIP", &["หุ้นเยอรมัน VIP"], Some("22:30"), Some("22:50"), None),
    entry("หุ้นรัสเซีย", IntlStocks, "หุ้นรัสเซีย", &["หุ้นรัสเซีย"], Some("22:30"), Some("23:00"), None),
    entry("แม่โขงโกลด์", Laos, "แม่โขงโกลด์", &["แม่โขงโกลด์"], Some("22:30"), Some("22:45"), None),
    entry("หวยลาวกาชาด", Laos, "หวยลาวกาชาด", &["หวยลาวกาชาด"], Some("23:00"), Some("23:30"), None),
    entry("รัสเซีย-visa", IntlStocks, "รัสเซีย VISA", &["รัสเซีย VISA"], Some("23:00"), Some("23:15"), None),
    entry("อังกฤษพิเศษ", IntlStocks, "อังกฤษพิเศษ", &["อังกฤษพิเศษ"], Some("23:00"), Some("23:15"), None),
    entry("เยอรมันพิเศษ", IntlStocks, "เยอรมันพิเศษ", &["เยอรมันพิเศษ"], Some("23:00"), Some("23:15"), None),
    entry("หุ้นยูโร", IntlStocks, "หุ้นยูโร", &["หุ้นยูโร"], Some("23:10"), Some("23:30"), None),
    entry("ลาวไอยรา", Laos, "ลาวไอยรา", &["ลาวไอยรา"], Some("23:15"), Some("23:30"), None),
    entry("ดาวโจนส์พิเศษ", IntlStocks, "ดาวโจนส์พิเศษ", &["ดาวโจนส์พิเศษ"], Some("23:15"), Some("23:30"), None),
    entry("ดาวโจนส์-vip-พิเศษ", IntlStocks, "ดาวโจนส์ VIP พิเศษ", &["ดาวโจนส์ VIP พิเศษ"], Some("23:15"), Some("23:30"), None),
    entry("หุ้นรัสเชีย-vip", IntlStocks, "หุ้นรัสเชีย VIP", &["หุ้นรัสเชีย VIP"], Some("23:20"), Some("23:50"), None),
    entry("หวยแคนาดา", IntlStocks, "หวยแคนาดา", &["หวยแคนาดา"], Some("23:30"), Some("00:05"), None),
    entry("แม่โขงไนท์", Laos, "แม่โขงไนท์", &["แม่โขงไนท์"], Some("23:30"), Some("23:45"), None),
    entry("หวยดาวโจนส์อเมริกา", IntlStocks, "หวยดาวโจนส์อเมริกา", &["หวยดาวโจนส์อเมริกา"], Some("23:55"), Some("00:30"), None),
    entry("หุ้นดาวโจนส์-vip", IntlStocks, "หุ้นดาวโจนส์ VIP", &["หุ้นดาวโจนส์ VIP"], Some("00:00"), Some("00:30"), None),
    entry("หวยดาวโจนส์-visa", IntlStocks, "หวยดาวโจนส์ VISA", &["หวยดาวโจนส์ VISA"], Some("00:00"), Some("00:15"), None),
    entry("หุ้นดาวโจนส์", IntlStocks, "หุ้นดาวโจนส์", &["หุ้นดาวโจนส์"], Some("01:00"), Some("03:15"), None),
    entry("หุ้นดาวโจนส์-star", IntlStocks, "หุ้นดาวโจนส์ STAR", &["หุ้นดาวโจนส์ STAR"], Some("01:00"), Some("01:30"), None),
    entry("ยี่กี-vip", Yeekee, "หวยยี่กี VIP", &["ยี่กี VIP", "ยี่กีวีไอพี"], None, None, Some("ออกผลทุก 15 นาที")),
    entry("ยี่กี-5-นาที", Yeekee, "ยี่กี 5 นาที", &["ยี่กี 5 นาที", "ยี่กีห้านาที"], None, None, Some("ออกผลทุก 5 นาที")),
    entry("ปิงปอง-พิเศษ", Others, "ปิงปองรอบพิเศษ", &["ปิงปอง", "ping pong"], None, None, Some("ตามประกาศหน้าเว็บ")),
];

static ALL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(ทั้งหมด|ตาราง|เวลาออกผลทั้งหมด|ดูเวลาทั้งหมด|all categories|all times)")
        .expect("valid all-categories pattern")
});

/// Group phrases, checked in order; the first hit decides the group.
static GROUP_PATTERNS: LazyLock<Vec<(ScheduleGroup, Regex)>> = LazyLock::new(|| {
    [
        (Laos, r"(?i)(ลาว|lao)"),
        (Hanoi, r"(?i)(ฮานอย|hn|hanoi)"),
        (ThaiStocks, r"(?i)(หุ้นไทย|set)"),
        (ThaiGov, r"(?i)(รัฐบาล|สลาก)"),
        (Yeekee, r"(?i)(ยี่กี|yeekee)"),
        (
            IntlStocks,
            r"(?i)(หุ้นต่างประเทศ|นิเคอิ|ฮั่งเส็ง|ดาวโจนส์|จีน|เกาหลี|ไต้หวัน|สิงคโปร์|taiwan|nikkei|hang\s*seng|dow)",
        ),
        (Others, r"(?i)(อื่นๆ|others)"),
    ]
    .into_iter()
    .map(|(group, pattern)| (group, Regex::new(pattern).expect("valid group pattern")))
    .collect()
});

/// Every entry in a group, in table order.
pub fn entries_in_group(group: ScheduleGroup) -> Vec<&'static ScheduleEntry> {
    DRAW_TIMES.iter().filter(|e| e.group == group).collect()
}

/// Resolve free text to schedule entries.
pub fn find_by_text(text: &str) -> Vec<&'static ScheduleEntry> {
    let lowered = text.to_lowercase();

    if ALL_PATTERN.is_match(&lowered) {
        return DRAW_TIMES.iter().collect();
    }

    if let Some((group, _)) = GROUP_PATTERNS.iter().find(|(_, re)| re.is_match(&lowered)) {
        return entries_in_group(*group);
    }

    DRAW_TIMES
        .iter()
        .filter(|e| e.aliases.iter().any(|a| lowered.contains(&a.to_lowercase())))
        .collect()
}

/// One display line: `• name — ปิดรับ x • ออกผล y (note)`.
pub fn format_entry(entry: &ScheduleEntry) -> String {
    let when = [
        entry.close_at.map(|t| format!("ปิดรับ {t}")),
        entry.announce_at.map(|t| format!("ออกผล {t}")),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" • ");

    let mut line = format!("• {}", entry.name);
    if !when.is_empty() {
        line.push_str(" — ");
        line.push_str(&when);
    }
    if let Some(note) = entry.note {
        line.push_str(&format!(" ({note})"));
    }
    line
}

/// Render entries under a header, split into chunks of at most `max_chars`.
pub fn render_chunks(entries: &[&ScheduleEntry], max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::from("⏰ ตารางเวลา");
    let mut current_len = current.chars().count();

    for entry in entries {
        let line = format_entry(entry);
        let line_len = line.chars().count();
        if current_len + 1 + line_len > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(&line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Reply used when nothing in the table matched.
pub fn category_hint() -> String {
    let categories = ScheduleGroup::ALL
        .iter()
        .map(|g| g.display_name())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "ขออภัยค่ะ ยังไม่เข้าใจว่าต้องการดูเวลาของหวยประเภทไหน 🙏\nลองพิมพ์หมวดเหล่านี้ได้เลยค่ะ: {categories}\nหรือพิมพ์ \"เวลาออกผลทั้งหมด\" เพื่อดูทั้งตาราง"
    )
}
