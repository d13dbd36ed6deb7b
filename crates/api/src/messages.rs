//! User-facing response text (Hebrew).

pub const UNAUTHORIZED: &str = "יש להתחבר כדי לבצע פעולה זו";
pub const FORBIDDEN: &str = "אין לך הרשאה לבצע פעולה זו";
pub const NOT_FOUND: &str = "הפריט המבוקש לא נמצא";
pub const VALIDATION: &str = "הנתונים שנשלחו אינם תקינים";
pub const SERVER_ERROR: &str = "אירעה שגיאה בשרת, נסו שוב מאוחר יותר";
pub const NOT_CONFIGURED: &str = "השרת אינו מוגדר כראוי, פנו למנהל המערכת";
pub const SERVICE_UNAVAILABLE: &str = "השירות אינו זמין כרגע";

pub const ALREADY_MEMBER: &str = "המשתמש כבר חבר בבניין זה";
pub const BUILDING_NOT_FOUND: &str = "הבניין לא נמצא";
pub const USER_NOT_FOUND: &str = "המשתמש לא נמצא";
pub const INVITE_NOT_FOUND: &str = "ההזמנה לא נמצאה";
pub const INVITE_INACTIVE: &str = "ההזמנה אינה פעילה";
pub const INVITE_EXPIRED: &str = "תוקף ההזמנה פג";
pub const INVITE_EXHAUSTED: &str = "ההזמנה מוצתה";
pub const INVITE_BUILDING_MISMATCH: &str = "ההזמנה אינה שייכת לבניין זה";
pub const DOCUMENT_NOT_FOUND: &str = "המסמך לא נמצא";

pub const SELF_DELETION: &str = "לא ניתן למחוק את המשתמש שלך";
pub const SELF_ROLE_CHANGE: &str = "לא ניתן לשנות את התפקיד שלך";
pub const ROLE_NOT_ASSIGNABLE: &str = "ניתן להגדיר רק תפקיד מנהל או דייר";

pub const PROFILE_CREATION_FAILED: &str = "יצירת פרופיל המשתמש נכשלה";
pub const MEMBERSHIP_NOT_CREATED: &str = "המשתמש נוצר אך לא ניתן היה לצרף אותו לבניין";
pub const MEMBERSHIP_NOT_ADDED: &str = "לא ניתן היה לצרף את המשתמש הקיים לבניין";
pub const IDENTITY_FAILED: &str = "שירות ההזדהות החזיר שגיאה";
pub const STORAGE_FAILED: &str = "לא ניתן להפיק קישור להורדת המסמך";

pub const USER_CREATED: &str = "המשתמש נוצר ונשלח אליו מייל להגדרת סיסמה";
pub const USER_CREATED_NO_EMAIL: &str = "המשתמש נוצר אך שליחת מייל הגדרת הסיסמה נכשלה";
pub const USER_ADDED: &str = "המשתמש הקיים צורף לבניין";
pub const USER_DELETED: &str = "המשתמש נמחק בהצלחה";
pub const ROLE_UPDATED: &str = "התפקיד עודכן בהצלחה";
pub const PENDING_INVITE_SAVED: &str = "ההזמנה נשמרה ותמומש לאחר ההרשמה";
