//! Static lookup tables shared by the variant generator, the classifier and
//! the voting analyzer. Entries are lowercase and use `\` for multi-component
//! fragments so they can be matched against [`crate::path_text::normalize_key`]
//! output directly.

/// Whole-word fragments that mark a path as belonging to the OS, a browser,
/// an IDE, a chat client, the host launcher, a game platform's own plumbing,
/// an anti-virus or driver stack, or a log or cache folder.
pub const BLACKLIST_KEYWORDS: &[&str] = &[
    // operating system
    "windows",
    "system32",
    "syswow64",
    "winsxs",
    "$recycle.bin",
    "system volume information",
    "programdata\\microsoft",
    "appdata\\local\\microsoft",
    "appdata\\roaming\\microsoft",
    "appdata\\local\\packages",
    "windowsapps",
    "temp",
    "prefetch",
    "crashdumps",
    "crashreports",
    "d3dscache",
    "inetcache",
    "webcache",
    // browsers
    "google\\chrome",
    "chrome",
    "chromium",
    "mozilla",
    "firefox",
    "microsoft\\edge",
    "opera software",
    "bravesoftware",
    "vivaldi",
    // IDEs and developer tooling
    "vscode",
    ".vscode",
    "jetbrains",
    "visual studio",
    ".git",
    "node_modules",
    ".nuget",
    ".cargo",
    // chat
    "discord",
    "slack",
    "telegram desktop",
    "wechat",
    "tencent files",
    "teams",
    "skype",
    // host launcher
    "playnite",
    // game platforms
    "steam\\logs",
    "steam\\appcache",
    "steam\\htmlcache",
    "steam\\config",
    "steamapps\\shadercache",
    "steamapps\\downloading",
    "epicgameslauncher",
    "epic games\\launcher",
    "ubisoft game launcher\\cache",
    "ea desktop",
    "battle.net",
    "gog galaxy",
    "galaxyclient",
    "wegame",
    "rockstar games launcher",
    // anti-virus and drivers
    "windows defender",
    "avast software",
    "kaspersky lab",
    "360safe",
    "huorong",
    "driverstore",
    "nvidia",
    "nvidia corporation",
    "amd",
    "intel",
    // logs and caches
    "logs",
    "cache",
    "caches",
    "gpucache",
    "code cache",
    "shadercache",
];

pub const SAVE_EXTENSIONS: &[&str] = &[
    "sav", "dat", "save", "sfs", "rpgsave", "rvdata", "rvdata2", "json", "xml", "yaml", "yml",
    "cfg", "config", "backup",
];

/// File-name fragments that suggest save content.
pub const SAVE_FILE_KEYWORDS: &[&str] = &[
    "save",
    "slot",
    "data",
    "record",
    "progress",
    "profile",
    "session",
    "checkpoint",
    "autosave",
    "quicksave",
    "persistent",
    "player",
    "存档",
    "进度",
    "セーブ",
];

/// Path tokens of locations games are expected to write saves under.
pub const STANDARD_LOCATION_TOKENS: &[&str] =
    &["appdata", "saved games", "my games", "documents", "steam"];

/// Directory-name suffixes of typical save folders, English, Chinese and
/// Japanese.
pub const SAVE_DIR_SUFFIXES: &[&str] = &[
    "save",
    "saves",
    "saved",
    "savegame",
    "savegames",
    "savedata",
    "data",
    "userdata",
    "config",
    "configs",
    "settings",
    "profile",
    "profiles",
    "storage",
    "存档",
    "存檔",
    "存储",
    "数据",
    "配置",
    "设置",
    "进度",
    "记录",
    "セーブ",
    "セーブデータ",
    "データ",
    "設定",
];

/// Name fragments of directories that commonly hold saves.
pub const COMMON_SAVE_DIR_FRAGMENTS: &[&str] = &[
    "save",
    "savegame",
    "savedata",
    "userdata",
    "profile",
    "slot",
    "progress",
    "persistent",
];

pub const CHINESE_SAVE_DIR_SUFFIXES: &[&str] = &[
    "存档",
    "存檔",
    "游戏存档",
    "存档文件",
    "保存",
    "进度",
    "记录",
    "セーブ",
    "セーブデータ",
];

/// Whole-word fragments of locations known to hold real saves.
pub const KNOWN_GOOD_PATH_FRAGMENTS: &[&str] = &[
    "appdata\\roaming",
    "appdata\\locallow",
    "appdata\\local",
    "saved games",
    "my games",
    "documents",
    "steam\\userdata",
];

/// Install-directory leaf names too generic to identify a game.
pub const GENERIC_INSTALL_LEAVES: &[&str] = &[
    "game",
    "games",
    "data",
    "bin",
    "bin64",
    "x64",
    "win64",
    "binaries",
    "app",
    "content",
    "common",
    "release",
    "build",
    "client",
    "launcher",
    "program files",
    "program files (x86)",
    "steamapps",
    "steam",
    "gog games",
    "epic games",
    "save",
    "saves",
];

/// Common title words and their short forms.
pub const WORD_SIMPLIFICATIONS: &[(&str, &[&str])] = &[
    ("the ", &[""]),
    ("project", &["proj", "p"]),
    ("edition", &["ed"]),
    ("remastered", &["remaster", "rm"]),
    ("definitive", &["def"]),
    ("collection", &["col"]),
    ("chapter", &["ch"]),
    ("episode", &["ep"]),
    ("simulator", &["sim"]),
    ("deluxe", &["dx"]),
    ("ultimate", &["ult"]),
    ("version", &["ver"]),
    ("online", &["ol"]),
    ("game of the year", &["goty"]),
    ("international", &["intl"]),
    ("director's cut", &["dc"]),
];

/// Japanese and Chinese title fragments and their romanized or English forms.
pub const TRANSLITERATIONS: &[(&str, &[&str])] = &[
    ("ファイナルファンタジー", &["final fantasy", "ff"]),
    ("ファイナル", &["final"]),
    ("ファンタジー", &["fantasy"]),
    ("ドラゴンクエスト", &["dragon quest", "dq"]),
    ("ドラゴン", &["dragon"]),
    ("クエスト", &["quest"]),
    ("モンスターハンター", &["monster hunter", "mh"]),
    ("モンスター", &["monster"]),
    ("ハンター", &["hunter"]),
    ("キングダムハーツ", &["kingdom hearts", "kh"]),
    ("ファンタシースター", &["phantasy star", "pso"]),
    ("シュタインズ・ゲート", &["steins;gate", "steinsgate"]),
    ("ペルソナ", &["persona"]),
    ("テイルズ", &["tales"]),
    ("アトリエ", &["atelier"]),
    ("ゼルダ", &["zelda"]),
    ("フェイト", &["fate"]),
    ("ストーリー", &["story"]),
    ("ロマンシング", &["romancing"]),
    ("ゲーム", &["game"]),
    ("ナイト", &["night", "knight"]),
    ("ワールド", &["world"]),
    ("サーガ", &["saga"]),
    ("ソード", &["sword"]),
    ("オンライン", &["online"]),
    ("仙剑奇侠传", &["pal", "xianjian"]),
    ("古剑奇谭", &["gujian"]),
    ("轩辕剑", &["xuanyuan sword", "xuanyuanjian"]),
    ("太吾绘卷", &["taiwu"]),
    ("鬼谷八荒", &["guigubahuang"]),
    ("三国志", &["sangokushi"]),
    ("原神", &["genshin"]),
    ("命运", &["fate"]),
];

/// Digits and their spelled-out form, applied in this order.
pub const NUMBER_WORDS: &[(&str, &str)] = &[
    ("0", "zero"),
    ("1", "one"),
    ("2", "two"),
    ("3", "three"),
    ("4", "four"),
    ("5", "five"),
    ("6", "six"),
    ("7", "seven"),
    ("8", "eight"),
    ("9", "nine"),
    ("10", "ten"),
];

/// Developer name fragments and the folder names their games tend to use.
pub const DEVELOPER_ALIASES: &[(&str, &[&str])] = &[
    ("type-moon", &["typemoon", "type_moon", "tm"]),
    ("visual arts", &["key", "visualarts"]),
    ("key", &["key", "visual arts", "visualarts"]),
    ("square enix", &["squareenix", "square_enix", "se"]),
    ("bandai namco", &["bandainamco", "namco", "bnei"]),
    ("koei tecmo", &["koeitecmo", "koei", "tecmo", "gust"]),
    ("nippon ichi", &["nis", "nippon1"]),
    ("falcom", &["falcom", "nihon falcom"]),
    ("atlus", &["atlus", "sega"]),
    ("capcom", &["capcom"]),
    ("fromsoftware", &["fromsoftware", "fromsoft"]),
    ("from software", &["fromsoftware", "fromsoft"]),
    ("cd projekt", &["cd projekt red", "cdprojektred", "cdpr"]),
    ("bethesda", &["bethesda", "bethesda softworks"]),
    ("ubisoft", &["ubisoft", "ubi"]),
    ("electronic arts", &["ea", "electronic arts"]),
    ("paradox", &["paradox interactive"]),
    ("spike chunsoft", &["spikechunsoft", "chunsoft"]),
    ("yuzusoft", &["yuzusoft", "yuzu"]),
    ("softhouse-chara", &["softhousechara", "shc"]),
    ("team cherry", &["teamcherry"]),
    ("mihoyo", &["mihoyo", "hoyoverse", "cognosphere"]),
    ("softstar", &["softstar", "pal"]),
    ("大宇", &["softstar"]),
    ("烛龙", &["aurogon"]),
    ("西山居", &["seasun", "kingsoft"]),
];
